use folio_refs::TitleIndex;

use crate::models::Link;

const COMMENTARY: &str = "Commentary";
const QUOTING_COMMENTARY: &str = "Quoting Commentary";
const QUOTING_SUFFIX: &str = "|Quoting";

/// One entry of a link filter: a category (`"Midrash"`) or a collective
/// title (`"Rashi"`), optionally suffixed with `|Quoting` to select only
/// quoting commentary by that title.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkFilter {
    pub name: String,
    pub quoting: bool,
}

impl LinkFilter {
    pub fn parse(filter: &str) -> Self {
        match filter.strip_suffix(QUOTING_SUFFIX) {
            Some(name) => Self { name: name.to_string(), quoting: true },
            None => Self { name: filter.to_string(), quoting: false },
        }
    }

    /// Returns `true` if `link` passes this filter.
    ///
    /// A filter naming a commentary work (per the title index) only passes
    /// links of category `Commentary`; a quoting filter only passes links of
    /// category `Quoting Commentary`. Either way the link's category or
    /// collective title must equal the filter name.
    pub fn matches(&self, link: &Link, index: &TitleIndex) -> bool {
        if self.quoting {
            if link.category != QUOTING_COMMENTARY {
                return false;
            }
        } else if index.is_commentary(&self.name) && link.category != COMMENTARY {
            return false;
        }
        link.category == self.name || link.collective_title.en == self.name
    }
}

/// Links passing any of `filters`; all links when there are none.
pub fn filter_links(links: &[Link], filters: &[impl AsRef<str>], index: &TitleIndex) -> Vec<Link> {
    if filters.is_empty() {
        return links.to_vec();
    }
    let filters: Vec<LinkFilter> = filters.iter().map(|f| LinkFilter::parse(f.as_ref())).collect();
    links.iter().filter(|link| filters.iter().any(|filter| filter.matches(link, index))).cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CollectiveTitle;
    use folio_refs::IndexEntry;
    use rstest::rstest;

    fn link(category: &str, title: &str) -> Link {
        Link {
            anchor_ref: "Genesis 1:1".to_string(),
            category: category.to_string(),
            collective_title: CollectiveTitle { en: title.to_string(), he: String::new() },
            ..Link::default()
        }
    }

    fn links() -> Vec<Link> {
        vec![
            link("Commentary", "Rashi"),
            link("Quoting Commentary", "Rashi"),
            link("Midrash", "Genesis Rabbah"),
            link("Talmud", "Berakhot"),
        ]
    }

    fn index() -> TitleIndex {
        let mut index = TitleIndex::new();
        index.add_index(IndexEntry::new("Rashi", ["Commentary"]));
        index
    }

    #[rstest]
    #[case(&[], &[0, 1, 2, 3])]
    #[case(&["Rashi"], &[0])]
    #[case(&["Rashi|Quoting"], &[1])]
    #[case(&["Midrash"], &[2])]
    #[case(&["Midrash", "Berakhot"], &[2, 3])]
    #[case(&["Commentary"], &[0])]
    #[case(&["Targum"], &[])]
    fn test_filter_links(#[case] filters: &[&str], #[case] expected: &[usize]) {
        let all = links();
        let kept: Vec<Link> = expected.iter().map(|&i| all[i].clone()).collect();
        assert_eq!(filter_links(&all, filters, &index()), kept);
    }

    #[test]
    fn test_parse_filter() {
        assert_eq!(LinkFilter::parse("Rashi|Quoting"), LinkFilter { name: "Rashi".to_string(), quoting: true });
        assert_eq!(LinkFilter::parse("Rashi"), LinkFilter { name: "Rashi".to_string(), quoting: false });
    }
}
