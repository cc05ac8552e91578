use crate::ScanError;

pub const KEYWORD_PLACEHOLDER: &str = "KEYWORD_PLACEHOLDER";
pub const DEFAULT_CQL_TEMPLATE: &str = "text~\"KEYWORD_PLACEHOLDER\"";

/// A CQL query with at least one keyword placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryTemplate {
    template: String,
}

impl QueryTemplate {
    pub fn parse(template: impl Into<String>) -> Result<Self, ScanError> {
        let template = template.into();
        if !template.contains(KEYWORD_PLACEHOLDER) {
            return Err(ScanError::InvalidTemplate(format!(
                "your CQL query must include the string {KEYWORD_PLACEHOLDER} \
                 where it will be replaced by the actual keyword"
            )));
        }
        Ok(Self { template })
    }

    pub fn render(&self, keyword: &str) -> String {
        self.template.replace(KEYWORD_PLACEHOLDER, keyword)
    }
}

impl Default for QueryTemplate {
    fn default() -> Self {
        Self {
            template: DEFAULT_CQL_TEMPLATE.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn template_without_placeholder_is_rejected() {
        let result = QueryTemplate::parse("text~\"secret\"");
        assert!(matches!(result, Err(ScanError::InvalidTemplate(_))));
    }

    #[test]
    fn every_placeholder_is_substituted() {
        let template = QueryTemplate::parse(
            "title~\"KEYWORD_PLACEHOLDER\" OR text~\"KEYWORD_PLACEHOLDER\"",
        )
        .expect("template should parse");
        assert_eq!(
            template.render("vpn"),
            "title~\"vpn\" OR text~\"vpn\""
        );
    }

    #[test]
    fn default_is_plain_text_match() {
        assert_eq!(QueryTemplate::default().render("token"), "text~\"token\"");
    }
}
