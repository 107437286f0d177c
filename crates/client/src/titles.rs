use exn::ResultExt;
use folio_config::TitlesConfig;
use folio_refs::TitleIndex;
use folio_transport::{ApiRequest, Transport};

use crate::error::{ErrorKind, Result};

/// Load the known titles from the configured file, or from the API's
/// `/api/index/titles` when no file is configured.
pub async fn load_titles(transport: &dyn Transport, config: &TitlesConfig) -> Result<TitleIndex> {
    let index = match &config.path {
        Some(path) => {
            let json = tokio::fs::read(path).await.or_raise(|| ErrorKind::Titles)?;
            TitleIndex::from_json(&json).or_raise(|| ErrorKind::Titles)?
        },
        None => {
            let value = transport
                .get_json(&ApiRequest::new(["api", "index", "titles"]))
                .await
                .or_raise(|| ErrorKind::Titles)?;
            TitleIndex::from_value(value).or_raise(|| ErrorKind::Titles)?
        },
    };
    tracing::info!(titles = index.len(), "Loaded book titles");
    Ok(index)
}
