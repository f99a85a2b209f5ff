use std::ffi::OsString;
use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use async_trait::async_trait;
use serde::Serialize;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use crate::config::BridgeConfig;
use crate::error::ModelError;
use crate::export::InferenceResult;
use crate::model::{InferenceRequest, ModelHandle, ReconstructionModel};
use crate::options::Device;

const IMPORT_CHECK_SCRIPT: &str = "import depth_anything_3.api";

// Reads one job from stdin. Weight download and caching happen inside the constructor.
const INFER_SCRIPT: &str = r#"
import json
import sys

from depth_anything_3.api import DepthAnything3

job = json.load(sys.stdin)
request = job["request"]

model = DepthAnything3(model_name=job["model_name"]).to(job["device"])
model.inference(
    image=request["images"],
    export_dir=request["export_dir"],
    export_format=request["export_format"],
    infer_gs=request["infer_gs"],
    align_to_input_ext_scale=request["align_to_input_ext_scale"],
    ref_view_strategy=request["ref_view_strategy"],
)
"#;

/// Runs Depth Anything 3 through its Python package.
pub struct Da3Python {
    config: BridgeConfig,
}

impl Da3Python {
    pub fn new(config: BridgeConfig) -> Self {
        Self { config }
    }

    fn command(&self, script: &str) -> Result<Command, ModelError> {
        let mut command = Command::new(&self.config.python);
        command.arg("-c").arg(script);

        if let Some(extra) = &self.config.python_path {
            let joined = prepend_python_path(extra, std::env::var_os("PYTHONPATH"))?;
            command.env("PYTHONPATH", joined);
        }
        Ok(command)
    }
}

/// `extra` followed by the entries of an existing `PYTHONPATH`, so it wins on import.
fn prepend_python_path(extra: &str, existing: Option<OsString>) -> Result<OsString, ModelError> {
    let mut paths = vec![PathBuf::from(extra)];
    if let Some(existing) = existing {
        paths.extend(std::env::split_paths(&existing));
    }
    std::env::join_paths(paths)
        .map_err(|err| ModelError::Io(std::io::Error::new(std::io::ErrorKind::InvalidInput, err)))
}

#[async_trait]
impl ReconstructionModel for Da3Python {
    type Handle = Da3Handle;

    async fn load(&self, name: &str, device: &Device) -> Result<Da3Handle, ModelError> {
        log::debug!("Checking that {} can import depth_anything_3", self.config.python);

        let output = self
            .command(IMPORT_CHECK_SCRIPT)?
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|err| ModelError::Load {
                name: name.to_owned(),
                reason: format!("cannot start {}: {err}", self.config.python),
            })?;

        if !output.status.success() {
            return Err(ModelError::Load {
                name: name.to_owned(),
                reason: format!(
                    "depth_anything_3 is not importable: {}",
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            });
        }

        Ok(Da3Handle {
            command: self.command(INFER_SCRIPT)?,
            model_name: name.to_owned(),
            device: *device,
        })
    }
}

pub struct Da3Handle {
    command: Command,
    model_name: String,
    device: Device,
}

#[derive(Serialize)]
struct Job<'a> {
    model_name: &'a str,
    device: String,
    request: &'a InferenceRequest,
}

#[async_trait]
impl ModelHandle for Da3Handle {
    async fn infer(mut self, request: InferenceRequest) -> Result<InferenceResult, ModelError> {
        let job = serde_json::to_vec(&Job {
            model_name: &self.model_name,
            device: self.device.to_string(),
            request: &request,
        })?;

        // The library reports its own progress, pass it straight through.
        let mut child = self
            .command
            .stdin(Stdio::piped())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .spawn()?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(&job).await?;
            stdin.shutdown().await?;
        }

        let status = child.wait().await?;
        check_status(status)?;

        Ok(InferenceResult::collect(&request.export_dir))
    }
}

fn check_status(status: ExitStatus) -> Result<(), ModelError> {
    if status.success() {
        Ok(())
    } else {
        Err(ModelError::Inference {
            status: status.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use image_source::ImageSet;
    use super::{prepend_python_path, Da3Python, Job};
    use crate::config::BridgeConfig;
    use crate::error::ModelError;
    use crate::model::{InferenceRequest, ModelHandle, ReconstructionModel};
    use crate::options::Device;

    #[test]
    fn test_job_json() {
        let images = ImageSet::from_paths(vec!["/data/b.jpg".into(), "/data/a.png".into()]);
        let request = InferenceRequest::new(images, "/out/splat".into());
        let job = Job {
            model_name: "da3-giant",
            device: Device::Cuda(None).to_string(),
            request: &request,
        };

        let json = serde_json::to_value(&job).expect("serialize");
        assert_eq!(
            json,
            serde_json::json!({
                "model_name": "da3-giant",
                "device": "cuda",
                "request": {
                    "images": ["/data/a.png", "/data/b.jpg"],
                    "export_dir": "/out/splat",
                    "export_format": "gs_ply",
                    "infer_gs": true,
                    "align_to_input_ext_scale": true,
                    "ref_view_strategy": "saddle_balanced",
                }
            })
        );
    }

    #[tokio::test]
    async fn test_missing_interpreter() {
        let model = Da3Python::new(
            BridgeConfig::new().with_python("definitely-not-a-python-interpreter".into()),
        );
        let result = model.load("da3-giant", &Device::Cpu).await;
        assert!(matches!(result, Err(ModelError::Load { .. })));
    }

    #[cfg(unix)]
    #[test]
    fn test_python_path_goes_first() {
        let joined = prepend_python_path("/opt/da3/src", Some("/usr/lib/site:/home/me/lib".into()))
            .expect("join");
        assert_eq!(joined, "/opt/da3/src:/usr/lib/site:/home/me/lib");

        let joined = prepend_python_path("/opt/da3/src", None).expect("join");
        assert_eq!(joined, "/opt/da3/src");
    }

    /// An executable shell script standing in for the interpreter. It is called as
    /// `<script> -c <python source>`, so `$2` tells the import check apart from inference.
    #[cfg(unix)]
    fn fake_python(dir: &std::path::Path, body: &str) -> String {
        use std::fs;
        use std::os::unix::fs::PermissionsExt;

        let path = dir.join("fake-python");
        fs::write(&path, format!("#!/bin/sh\n{body}\n")).expect("write script");
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).expect("chmod");
        path.to_string_lossy().into_owned()
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_job_reaches_interpreter() {
        let dir = tempfile::tempdir().expect("temp dir");
        let record = dir.path().display();
        let python = fake_python(
            dir.path(),
            &format!(
                "if [ \"$2\" = \"import depth_anything_3.api\" ]; then exit 0; fi\n\
                 printf '%s' \"$PYTHONPATH\" > \"{record}/pythonpath.txt\"\n\
                 cat > \"{record}/job.json\""
            ),
        );

        let model = Da3Python::new(
            BridgeConfig::new()
                .with_python(python)
                .with_python_path(Some("/opt/da3/src".into())),
        );
        let handle = model
            .load("da3-giant", &Device::Cuda(Some(1)))
            .await
            .expect("load");

        let export_dir = dir.path().join("out");
        let images = ImageSet::from_paths(vec!["/data/b.jpg".into(), "/data/a.png".into()]);
        let result = handle
            .infer(InferenceRequest::new(images, export_dir.clone()))
            .await
            .expect("infer");
        assert_eq!(result.export_dir, export_dir);
        assert!(result.artifacts.is_empty());

        let job = std::fs::read_to_string(dir.path().join("job.json")).expect("job written");
        let job: serde_json::Value = serde_json::from_str(&job).expect("job is json");
        assert_eq!(job["model_name"], "da3-giant");
        assert_eq!(job["device"], "cuda:1");
        assert_eq!(job["request"]["images"], serde_json::json!(["/data/a.png", "/data/b.jpg"]));
        assert_eq!(job["request"]["export_format"], "gs_ply");
        assert_eq!(job["request"]["ref_view_strategy"], "saddle_balanced");

        let python_path =
            std::fs::read_to_string(dir.path().join("pythonpath.txt")).expect("path written");
        assert!(python_path.starts_with("/opt/da3/src"), "got {python_path}");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_failed_inference() {
        let dir = tempfile::tempdir().expect("temp dir");
        let python = fake_python(
            dir.path(),
            "if [ \"$2\" = \"import depth_anything_3.api\" ]; then exit 0; fi\n\
             cat > /dev/null\n\
             exit 3",
        );

        let model = Da3Python::new(BridgeConfig::new().with_python(python));
        let handle = model.load("da3-giant", &Device::Cpu).await.expect("load");
        let request = InferenceRequest::new(
            ImageSet::from_paths(vec!["/data/a.png".into()]),
            dir.path().join("out"),
        );

        match handle.infer(request).await {
            Err(ModelError::Inference { status }) => assert!(status.contains('3'), "got {status}"),
            other => panic!("expected an inference error, got {other:?}"),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_library_not_importable() {
        let dir = tempfile::tempdir().expect("temp dir");
        let python = fake_python(
            dir.path(),
            "echo \"ModuleNotFoundError: No module named 'depth_anything_3'\" >&2\nexit 1",
        );

        let model = Da3Python::new(BridgeConfig::new().with_python(python));
        match model.load("da3-giant", &Device::Cpu).await {
            Err(ModelError::Load { reason, .. }) => assert!(reason.contains("depth_anything_3")),
            Err(other) => panic!("expected a load error, got {other:?}"),
            Ok(_) => panic!("load should fail"),
        }
    }
}
