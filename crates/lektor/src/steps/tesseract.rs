//! Tesseract OCR invocation.

use super::{CommandLine, Step, StepContext, StepKind, StepOutput, StepParams, base_name, parse_params, require_file};
use crate::{LektorError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Deserializer};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

pub const TAG: &str = "tesseract";

fn default_bin() -> String {
    "tesseract".to_string()
}

fn string_or_list<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Vec<String>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(raw) => raw
            .split([',', ' '])
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
        OneOrMany::Many(items) => items,
    })
}

/// `[[steps]]` parameters of `type = "tesseract"`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TesseractParams {
    #[serde(default = "default_bin")]
    pub tesseract_bin: String,
    /// Model names for `-l`, e.g. `frk+deu`.
    #[serde(default)]
    pub model_configs: Option<String>,
    /// Output configs such as `alto`, a list or comma separated.
    #[serde(default, deserialize_with = "string_or_list")]
    pub output_configs: Vec<String>,
    /// Further raw arguments, e.g. `--dpi 470`.
    #[serde(default)]
    pub extra: Option<String>,
    /// Output directory, the input's directory if unset.
    #[serde(default)]
    pub path_out_folder: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct TesseractStep {
    params: TesseractParams,
    model: String,
}

impl TesseractStep {
    pub fn new(params: TesseractParams) -> Result<Self> {
        let model = params
            .model_configs
            .as_deref()
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .map(str::to_string);
        let Some(model) = model else {
            return Err(LektorError::validation(format!(
                "Invalid arguments for tesseract: missing model_configs in {:?}",
                params
            )));
        };
        if params.output_configs.is_empty() {
            return Err(LektorError::validation(format!(
                "Invalid arguments for tesseract: missing output_configs in {:?}",
                params
            )));
        }
        Ok(Self { params, model })
    }

    pub fn create(params: &StepParams) -> Result<Arc<dyn Step>> {
        Ok(Arc::new(Self::new(parse_params(TAG, params)?)?))
    }

    /// Output base path, tesseract appends the extension itself.
    pub fn output_base(&self, input: &Path) -> Result<PathBuf> {
        let folder = match &self.params.path_out_folder {
            Some(folder) => folder.clone(),
            None => input.parent().map(Path::to_path_buf).unwrap_or_default(),
        };
        Ok(folder.join(base_name(input)?))
    }

    /// `bin <input> <output-base> <extra...> -l <model> <output configs...>`
    pub fn command(&self, input: &Path) -> Result<CommandLine> {
        let output_base = self.output_base(input)?;
        let mut cmd = CommandLine::new(&self.params.tesseract_bin)
            .arg(input.display().to_string())
            .arg(output_base.display().to_string());
        if let Some(extra) = &self.params.extra {
            cmd = cmd.tokens(extra);
        }
        cmd = cmd.flag("-l", &self.model);
        for config in &self.params.output_configs {
            cmd = cmd.arg(config);
        }
        Ok(cmd)
    }
}

#[async_trait]
impl Step for TesseractStep {
    fn name(&self) -> &str {
        TAG
    }

    fn kind(&self) -> StepKind {
        StepKind::External
    }

    async fn execute(&self, ctx: &StepContext) -> Result<StepOutput> {
        require_file(&ctx.input)?;
        let cmd = self.command(&ctx.input)?;
        tracing::debug!("run '{}'", cmd);

        let started = Instant::now();
        let mut command = cmd.to_command();
        command.env("OMP_THREAD_LIMIT", "1");
        let output = command
            .output()
            .await
            .map_err(|e| LektorError::Process(format!("Failed to run '{}': {}", cmd, e)))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(LektorError::Process(format!(
                "'{}' exited with {}: {}",
                cmd,
                output.status,
                stderr.trim()
            )));
        }

        let mut path_next = self.output_base(&ctx.input)?.into_os_string();
        path_next.push(".xml");
        let path_next = PathBuf::from(path_next);
        if !path_next.exists() {
            return Err(LektorError::Process(format!(
                "'{}' created no output '{}'",
                cmd,
                path_next.display()
            )));
        }
        tracing::debug!("tesseract done in {:.2}s", started.elapsed().as_secs_f64());
        Ok(StepOutput::next(path_next))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn params(value: serde_json::Value) -> StepParams {
        match value {
            serde_json::Value::Object(map) => map,
            _ => panic!("object expected"),
        }
    }

    #[test]
    fn test_command_layout() {
        let step = TesseractStep::create(&params(json!({
            "model_configs": "frk",
            "output_configs": ["alto"],
            "extra": "--dpi 470",
        })))
        .unwrap();
        assert_eq!(step.kind(), StepKind::External);

        let step = TesseractStep::new(
            parse_params(
                TAG,
                &params(json!({"model_configs": "frk", "output_configs": "alto", "extra": "--dpi 470"})),
            )
            .unwrap(),
        )
        .unwrap();
        let cmd = step.command(Path::new("/scan/0001.tif")).unwrap();
        assert_eq!(cmd.to_string(), "tesseract /scan/0001.tif /scan/0001 --dpi 470 -l frk alto");
    }

    #[test]
    fn test_output_folder() {
        let step = TesseractStep::new(TesseractParams {
            tesseract_bin: "tess".to_string(),
            model_configs: Some("frk+deu".to_string()),
            output_configs: vec!["alto".to_string(), "txt".to_string()],
            extra: None,
            path_out_folder: Some(PathBuf::from("/work")),
        })
        .unwrap();
        let cmd = step.command(Path::new("/scan/0002.jpg")).unwrap();
        assert_eq!(cmd.to_string(), "tess /scan/0002.jpg /work/0002 -l frk+deu alto txt");
    }

    #[test]
    fn test_invalid_arguments() {
        let missing_model = TesseractStep::create(&params(json!({"output_configs": "alto"})));
        assert!(matches!(missing_model, Err(LektorError::Validation { .. })));

        let blank_model = TesseractStep::create(&params(json!({"model_configs": "  ", "output_configs": "alto"})));
        assert!(blank_model.is_err());

        let no_output = TesseractStep::create(&params(json!({"model_configs": "frk"})));
        let err = no_output.err().unwrap();
        assert!(err.to_string().contains("Invalid arguments"));
    }

    #[tokio::test]
    async fn test_missing_input_is_io() {
        let step = TesseractStep::create(&params(json!({"model_configs": "frk", "output_configs": "alto"}))).unwrap();
        let err = step.execute(&StepContext::new("/nonexistent/0001.tif")).await.unwrap_err();
        assert!(matches!(err, LektorError::Io(_)));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_execute_with_fake_binary() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let bin = dir.path().join("fake-tesseract");
        std::fs::write(&bin, "#!/bin/sh\necho '<alto/>' > \"$2.xml\"\n").unwrap();
        std::fs::set_permissions(&bin, std::fs::Permissions::from_mode(0o755)).unwrap();
        let image = dir.path().join("0003.tif");
        std::fs::write(&image, b"II*").unwrap();

        let step = TesseractStep::create(&params(json!({
            "tesseract_bin": bin.display().to_string(),
            "model_configs": "frk",
            "output_configs": "alto",
        })))
        .unwrap();
        let output = step.execute(&StepContext::new(&image)).await.unwrap();
        assert_eq!(output.path_next, Some(dir.path().join("0003.xml")));
        assert!(dir.path().join("0003.xml").exists());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_nonzero_exit_is_process_error() {
        let dir = tempfile::tempdir().unwrap();
        let image = dir.path().join("0004.tif");
        std::fs::write(&image, b"II*").unwrap();

        let step = TesseractStep::create(&params(json!({
            "tesseract_bin": "false",
            "model_configs": "frk",
            "output_configs": "alto",
        })))
        .unwrap();
        let err = step.execute(&StepContext::new(&image)).await.unwrap_err();
        assert!(matches!(err, LektorError::Process(_)));
    }
}
