//! Steps that talk to an attached device over adb

use crate::adb::{is_not_installed, parse_devices, parse_pid, select_device, Device};
use crate::gradle::{find_artifact, GradleTask};
use crate::project::AndroidProject;
use crate::tools::{Tool, Toolbox};
use async_trait::async_trait;
use deploid_core::{Context, Error, Result, Step};

/// Devices currently known to adb
pub async fn list_devices(ctx: &Context, adb: &Tool) -> Result<Vec<Device>> {
    let result = ctx
        .capture_checked(adb.command().args(["devices", "-l"]))
        .await?;
    Ok(parse_devices(&result.stdout))
}

/// Serial chosen from `--device`, `android.device` or the single attached device
pub async fn target_device(ctx: &Context, adb: &Tool) -> Result<String> {
    let devices = list_devices(ctx, adb).await?;
    let serial = select_device(
        ctx.flags.device.as_deref(),
        ctx.config.android.device.as_deref(),
        &devices,
    )?;
    ctx.logger.debug(format!("target device: {}", serial));
    Ok(serial)
}

/// Install the latest APK and launch it
#[derive(Debug, Clone, Default)]
pub struct DeployStep {
    tools: Toolbox,
}

impl DeployStep {
    pub fn new(tools: Toolbox) -> Self {
        Self { tools }
    }
}

#[async_trait]
impl Step for DeployStep {
    fn name(&self) -> &str {
        "deploy"
    }

    async fn run(&self, ctx: &Context) -> Result<()> {
        let release = ctx
            .flags
            .release
            .unwrap_or(ctx.config.android.build.release);
        // bundles cannot be sideloaded, so always look for an APK
        let task = GradleTask::select(release, false);
        let project = AndroidProject::for_context(ctx);
        let apk = find_artifact(project.root(), task)?;

        let serial = target_device(ctx, &self.tools.adb).await?;
        let adb = || self.tools.adb.command().args(["-s", serial.as_str()]);

        ctx.logger
            .info(format!("Installing {} on {}", apk.display(), serial));
        ctx.run(adb().args(["install", "-r"]).arg(apk.to_string_lossy()))
            .await?;

        let app_id = &ctx.config.app_id;
        ctx.run(adb().args([
            "shell",
            "monkey",
            "-p",
            app_id.as_str(),
            "-c",
            "android.intent.category.LAUNCHER",
            "1",
        ]))
        .await?;

        ctx.logger
            .success(format!("{} launched on {}", ctx.config.app_name, serial));
        Ok(())
    }
}

/// Print attached devices
#[derive(Debug, Clone, Default)]
pub struct DevicesStep {
    tools: Toolbox,
}

impl DevicesStep {
    pub fn new(tools: Toolbox) -> Self {
        Self { tools }
    }
}

#[async_trait]
impl Step for DevicesStep {
    fn name(&self) -> &str {
        "devices"
    }

    async fn run(&self, ctx: &Context) -> Result<()> {
        let devices = list_devices(ctx, &self.tools.adb).await?;
        if devices.is_empty() {
            ctx.logger.info("No devices attached");
            return Ok(());
        }

        let width = devices.iter().map(|d| d.serial.len()).max().unwrap_or(0);
        for device in &devices {
            ctx.logger.info(format!(
                "{:<width$}  {:<12}  {}",
                device.serial,
                device.state.as_str(),
                device.label(),
                width = width
            ));
        }
        Ok(())
    }
}

/// Stream logcat, filtered to the app when it is running
#[derive(Debug, Clone, Default)]
pub struct LogsStep {
    tools: Toolbox,
}

impl LogsStep {
    pub fn new(tools: Toolbox) -> Self {
        Self { tools }
    }
}

#[async_trait]
impl Step for LogsStep {
    fn name(&self) -> &str {
        "logs"
    }

    async fn run(&self, ctx: &Context) -> Result<()> {
        let serial = target_device(ctx, &self.tools.adb).await?;
        let adb = || self.tools.adb.command().args(["-s", serial.as_str()]);

        let app_id = ctx.config.app_id.as_str();
        let pidof = ctx.capture(adb().args(["shell", "pidof", app_id])).await?;
        let logcat = match parse_pid(&pidof.stdout).filter(|_| pidof.success) {
            Some(pid) => {
                ctx.logger
                    .info(format!("Streaming logs for {} (pid {})", app_id, pid));
                adb().arg("logcat").arg(format!("--pid={}", pid))
            }
            None => {
                ctx.logger.warn(format!(
                    "{} is not running, streaming unfiltered logcat",
                    app_id
                ));
                adb().arg("logcat")
            }
        };
        ctx.run(logcat).await
    }
}

/// Remove the app from the device
#[derive(Debug, Clone, Default)]
pub struct UninstallStep {
    tools: Toolbox,
}

impl UninstallStep {
    pub fn new(tools: Toolbox) -> Self {
        Self { tools }
    }
}

#[async_trait]
impl Step for UninstallStep {
    fn name(&self) -> &str {
        "uninstall"
    }

    async fn run(&self, ctx: &Context) -> Result<()> {
        let serial = target_device(ctx, &self.tools.adb).await?;
        let app_id = ctx.config.app_id.as_str();
        let command = self
            .tools
            .adb
            .command()
            .args(["-s", serial.as_str(), "uninstall", app_id]);
        let display = command.display();
        let result = ctx.capture(command).await?;
        let output = result.combined_output();

        if result.success && output.contains("Success") {
            ctx.logger
                .success(format!("Uninstalled {} from {}", app_id, serial));
            Ok(())
        } else if is_not_installed(&output) {
            ctx.logger
                .info(format!("{} is not installed on {}", app_id, serial));
            Ok(())
        } else {
            Err(Error::command_failed(&display, result.exit_code, &output))
        }
    }
}
