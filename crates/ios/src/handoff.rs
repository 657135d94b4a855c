//! `ios-handoff`: notes for finishing the iOS build in Xcode

use crate::project::{IosProject, HANDOFF_FILE};
use async_trait::async_trait;
use deploid_core::{Context, Error, ErrorCode, Result, Step};
use handlebars::Handlebars;
use serde::Serialize;
use std::fs;

const TEMPLATE: &str = r#"# {{app_name}} on iOS

Generated by deploid {{version}}. Re-running `deploid ios` overwrites this file.

| | |
|---|---|
| Bundle identifier | `{{app_id}}` |
| Deployment target | iOS {{deployment_target}} |
| Development team | {{#if team_id}}`{{team_id}}`{{else}}not set (`ios.teamId`){{/if}} |
| Web assets | `{{web_dir}}` |

## Finish the build

1. Install CocoaPods dependencies: `cd ios/App && pod install`
2. Open `{{workspace}}` in Xcode.
3. Select the **App** target, then **Signing & Capabilities**.
{{#if team_id}}
   Choose the team `{{team_id}}`.
{{else}}
   Choose your development team, or set `ios.teamId` and run `deploid ios` again.
{{/if}}
4. Set the minimum deployment to iOS {{deployment_target}} under **General**.
5. Product > Archive, then distribute through the Organizer.

## After web changes

Run `{{build_command}}` and `npx cap sync ios` before archiving again.
"#;

#[derive(Debug, Serialize)]
struct HandoffData<'a> {
    app_name: &'a str,
    app_id: &'a str,
    version: &'static str,
    team_id: Option<&'a str>,
    deployment_target: &'a str,
    web_dir: String,
    build_command: &'a str,
    workspace: String,
}

/// Render the hand-off document for the current configuration
pub fn render(ctx: &Context) -> Result<String> {
    let ios = ctx.config.ios.clone().unwrap_or_default();
    let project = IosProject::for_context(ctx);
    let workspace = project
        .workspace()
        .strip_prefix(&ctx.cwd)
        .map(|p| p.to_path_buf())
        .unwrap_or_else(|_| project.workspace());

    let data = HandoffData {
        app_name: &ctx.config.app_name,
        app_id: &ctx.config.app_id,
        version: env!("CARGO_PKG_VERSION"),
        team_id: ios.team_id.as_deref().filter(|t| !t.is_empty()),
        deployment_target: &ios.deployment_target,
        web_dir: ctx.config.web.web_dir.to_string_lossy().into_owned(),
        build_command: &ctx.config.web.build_command,
        workspace: workspace.to_string_lossy().into_owned(),
    };

    let mut registry = Handlebars::new();
    registry.set_strict_mode(true);
    registry.register_escape_fn(handlebars::no_escape);
    registry
        .register_template_string(HANDOFF_FILE, TEMPLATE)
        .map_err(|e| template_error(&e))?;
    registry
        .render(HANDOFF_FILE, &data)
        .map_err(|e| template_error(&e))
}

fn template_error(err: &dyn std::fmt::Display) -> Error {
    Error::native(
        ErrorCode::TemplateError,
        format!("Cannot render {}: {}", HANDOFF_FILE, err),
    )
}

#[derive(Debug, Clone, Default)]
pub struct IosHandoffStep;

#[async_trait]
impl Step for IosHandoffStep {
    fn name(&self) -> &str {
        "ios-handoff"
    }

    async fn run(&self, ctx: &Context) -> Result<()> {
        let project = IosProject::for_context(ctx);
        let text = render(ctx)?;
        fs::create_dir_all(project.root())?;
        fs::write(project.handoff(), text)?;
        ctx.logger.success(format!(
            "Xcode instructions written to {}",
            project.handoff().display()
        ));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use deploid_core::testing::{config_from, context_with, demo_config_json, demo_context};
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_render_without_team() {
        let (ctx, _) = demo_context(std::path::Path::new("/project"));
        let text = render(&ctx).unwrap();
        assert!(text.starts_with("# Demo on iOS\n"));
        assert!(text.contains("| Bundle identifier | `com.x.demo` |"));
        assert!(text.contains("iOS 13.0"));
        assert!(text.contains("not set (`ios.teamId`)"));
        assert!(text.contains("Open `ios/App/App.xcworkspace`"));
        assert!(text.contains("Run `echo ok`"));
    }

    #[test]
    fn test_render_with_team() {
        let mut json = demo_config_json();
        json["ios"] = json!({ "teamId": "ABCDE12345", "deploymentTarget": "15.0" });
        let (ctx, _) = context_with(std::path::Path::new("/project"), config_from(json));
        let text = render(&ctx).unwrap();
        assert!(text.contains("Choose the team `ABCDE12345`."));
        assert!(text.contains("iOS 15.0"));
        assert!(!text.contains("not set"));
    }

    #[tokio::test]
    async fn test_step_writes_file() {
        let dir = TempDir::new().unwrap();
        let (ctx, _) = demo_context(dir.path());
        IosHandoffStep.run(&ctx).await.unwrap();
        let written = fs::read_to_string(dir.path().join("ios/DEPLOID_IOS.md")).unwrap();
        assert!(written.contains("com.x.demo"));
    }
}
