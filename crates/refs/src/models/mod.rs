mod parsed;
mod section;

pub use self::parsed::ParsedRef;
pub use self::section::Section;

fn join(sections: &[Section], separator: &str) -> String {
    sections.iter().map(Section::as_str).collect::<Vec<_>>().join(separator)
}
