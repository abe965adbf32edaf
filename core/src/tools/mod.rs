use crate::error::{Error, Result};
use crate::traits::{SearchProvider, ToolCallRequest, ToolDefinition};
use std::sync::LazyLock;

pub mod web_search;

pub use web_search::{SearchArgs, WEB_SEARCH_TOOL, search_or_describe};

static CATALOG: LazyLock<Vec<ToolDefinition>> =
    LazyLock::new(|| vec![web_search::definition()]);

pub fn catalog() -> &'static [ToolDefinition] {
    &CATALOG
}

pub fn lookup(name: &str) -> Result<&'static ToolDefinition> {
    catalog()
        .iter()
        .find(|t| t.name == name)
        .ok_or_else(|| Error::UnknownTool(name.to_string()))
}

#[derive(Debug, Clone, PartialEq)]
pub enum ToolInvocation {
    WebSearch(SearchArgs),
}

impl ToolInvocation {
    pub fn from_call(call: &ToolCallRequest) -> Result<Self> {
        let definition = lookup(&call.tool_name)?;

        match definition.name.as_str() {
            WEB_SEARCH_TOOL => {
                let args: SearchArgs = call.decode_arguments()?;
                if args.query.trim().is_empty() {
                    return Err(Error::InvalidToolArguments {
                        tool: call.tool_name.clone(),
                        message: "query must not be empty".into(),
                    });
                }
                Ok(Self::WebSearch(args))
            }
            other => Err(Error::UnknownTool(other.to_string())),
        }
    }

    pub async fn execute(&self, search: &dyn SearchProvider) -> String {
        match self {
            Self::WebSearch(args) => search_or_describe(search, &args.query).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(name: &str, arguments: &str) -> ToolCallRequest {
        ToolCallRequest {
            call_id: "call_1".into(),
            tool_name: name.into(),
            arguments: arguments.into(),
        }
    }

    #[test]
    fn catalog_holds_only_web_search() {
        let tools = catalog();
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0].name, "search_perplexity");
        assert_eq!(tools[0].required_parameters(), vec!["query"]);
        assert_eq!(tools[0].parameters["properties"]["query"]["type"], "string");
    }

    #[test]
    fn unknown_tool_is_rejected() {
        let err = ToolInvocation::from_call(&call("book_flight", "{}")).unwrap_err();
        assert!(matches!(err, Error::UnknownTool(name) if name == "book_flight"));
    }

    #[test]
    fn missing_query_is_invalid() {
        let err = ToolInvocation::from_call(&call(WEB_SEARCH_TOOL, r#"{"q": "x"}"#)).unwrap_err();
        assert!(matches!(err, Error::InvalidToolArguments { .. }));
    }

    #[test]
    fn blank_query_is_invalid() {
        let err =
            ToolInvocation::from_call(&call(WEB_SEARCH_TOOL, r#"{"query": "  "}"#)).unwrap_err();
        assert!(matches!(err, Error::InvalidToolArguments { .. }));
    }

    #[test]
    fn valid_call_decodes() {
        let invocation =
            ToolInvocation::from_call(&call(WEB_SEARCH_TOOL, r#"{"query": "Kyoto in May"}"#))
                .unwrap();
        assert_eq!(
            invocation,
            ToolInvocation::WebSearch(SearchArgs {
                query: "Kyoto in May".into()
            })
        );
    }
}
