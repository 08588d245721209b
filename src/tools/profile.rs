use crate::tools::registry::Tool;
use crate::types::{Result, RunContext};
use async_trait::async_trait;
use serde_json::{json, Value};

/// `get_info` tool: the user's profile from the run context
pub struct GetInfoTool;

/// Render a profile as the sentence handed back to the model
pub fn describe_profile(ctx: &RunContext) -> String {
    let profile = &ctx.profile;
    if profile.interests.is_empty() {
        format!("The name of user is {}.", profile.name)
    } else {
        format!(
            "The name of user is {}, and their interests are {}.",
            profile.name,
            profile.interests.join(", ")
        )
    }
}

#[async_trait]
impl Tool for GetInfoTool {
    fn name(&self) -> &str {
        "get_info"
    }

    fn description(&self) -> &str {
        "Return the user's profile information from the run context."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {}
        })
    }

    async fn execute(&self, ctx: &RunContext, _args: Value) -> Result<Value> {
        Ok(Value::String(describe_profile(ctx)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::UserProfile;

    #[tokio::test]
    async fn test_get_info_reads_context() {
        let ctx = RunContext::new(
            UserProfile {
                name: "nafay".to_string(),
                interests: vec!["AI".to_string(), "Agentic AI".to_string()],
            },
            "test",
        );
        let value = GetInfoTool.execute(&ctx, json!({})).await.unwrap();
        assert_eq!(
            value,
            json!("The name of user is nafay, and their interests are AI, Agentic AI.")
        );
    }

    #[test]
    fn test_describe_without_interests() {
        let ctx = RunContext::new(
            UserProfile {
                name: "guest".to_string(),
                interests: vec![],
            },
            "test",
        );
        assert_eq!(describe_profile(&ctx), "The name of user is guest.");
    }
}
