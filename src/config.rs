//! Configuration types for a searchable-PDF run.
//!
//! Every path, suffix, external command and timeout lives in
//! [`PipelineConfig`], built via [`PipelineConfigBuilder`] and passed by
//! reference to each pipeline stage. Nothing is read from module-level
//! globals, so two runs with different configs can share a process.

use crate::error::SearchablePdfError;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};

/// Suffix of the per-page ALTO layout files.
pub const DEFAULT_LAYOUT_SUFFIX: &str = "_alto.xml";
/// Suffix of the per-page access scans.
pub const DEFAULT_IMAGE_SUFFIX: &str = "_access.jp2";
/// Suffix appended to the output stem; the object id is read back from it.
pub const OUTPUT_SUFFIX: &str = "_pdf.pdf";

/// Configuration for one object-to-PDF run.
///
/// # Example
/// ```rust
/// use alto_searchable_pdf::{PipelineConfig, OutputNaming};
///
/// let config = PipelineConfig::builder()
///     .output_dir("out")
///     .stylesheet("xsl/alto2hocr.xsl")
///     .naming(OutputNaming::FirstImage)
///     .tool_timeout_secs(120)
///     .build()
///     .unwrap();
/// assert_eq!(config.tool_timeout_secs, 120);
/// ```
#[derive(Clone)]
pub struct PipelineConfig {
    /// Filename suffix identifying layout files. Default: `_alto.xml`.
    pub layout_suffix: String,

    /// Filename suffix identifying page images. Default: `_access.jp2`.
    pub image_suffix: String,

    /// Directory receiving the finished PDF. Created when missing. Default: `output`.
    pub output_dir: PathBuf,

    /// Parent of the per-run scratch directories. Default: `output/tmp`.
    ///
    /// Each run creates its own `<object>-<uuid>` child here, so concurrent
    /// runs never see each other's intermediates.
    pub scratch_root: PathBuf,

    /// ALTO → hOCR stylesheet passed to the transform command as `{stylesheet}`.
    pub stylesheet: PathBuf,

    /// Layout transform command, run once per layout file.
    pub transform: ToolCommand,

    /// Document assembly command, run once over the page directory (`{dir}`).
    /// Its stdout becomes the assembled PDF.
    pub assemble: ToolCommand,

    /// How page scans are turned into JPEG working copies.
    pub image_backend: ImageBackend,

    /// How the output filename is derived.
    pub naming: OutputNaming,

    /// Explicit object identifier for the dump lookup. When `None` it is
    /// derived from the output filename (see [`derive_object_id`]).
    pub object_id: Option<String>,

    /// Upper bound on every external invocation, in seconds. Default: 300.
    ///
    /// A hung XSLT engine or assembler is killed and the run fails with
    /// [`SearchablePdfError::ToolTimeout`].
    pub tool_timeout_secs: u64,

    /// Optional stage/page progress callback.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            layout_suffix: DEFAULT_LAYOUT_SUFFIX.to_string(),
            image_suffix: DEFAULT_IMAGE_SUFFIX.to_string(),
            output_dir: PathBuf::from("output"),
            scratch_root: PathBuf::from("output/tmp"),
            stylesheet: PathBuf::from("alto2hocr.xsl"),
            transform: ToolCommand::saxon("java", "SaxonHE9-7-0-21J/saxon9he.jar"),
            assemble: ToolCommand::hocr_pdf("hocr-pdf"),
            image_backend: ImageBackend::default(),
            naming: OutputNaming::default(),
            object_id: None,
            tool_timeout_secs: 300,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for PipelineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineConfig")
            .field("layout_suffix", &self.layout_suffix)
            .field("image_suffix", &self.image_suffix)
            .field("output_dir", &self.output_dir)
            .field("scratch_root", &self.scratch_root)
            .field("stylesheet", &self.stylesheet)
            .field("transform", &self.transform)
            .field("assemble", &self.assemble)
            .field("image_backend", &self.image_backend)
            .field("naming", &self.naming)
            .field("object_id", &self.object_id)
            .field("tool_timeout_secs", &self.tool_timeout_secs)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn PipelineProgressCallback>"),
            )
            .finish()
    }
}

impl PipelineConfig {
    /// Create a new builder for `PipelineConfig`.
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder {
            config: Self::default(),
        }
    }

    /// Output filename for an object, following [`Self::naming`].
    ///
    /// `first_image` is the path of the first discovered page scan.
    pub fn output_file_name(&self, object_dir: &Path, first_image: &Path) -> String {
        let stem = match self.naming {
            OutputNaming::ObjectDirectory => object_dir
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "object".to_string()),
            OutputNaming::FirstImage => {
                let name = first_image
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                name.strip_suffix(self.image_suffix.as_str())
                    .map(str::to_string)
                    .unwrap_or(name)
            }
        };
        format!("{stem}{OUTPUT_SUFFIX}")
    }

    /// The object identifier used to query the metadata dump.
    ///
    /// Under [`OutputNaming::FirstImage`] a trailing `_<digits>` page
    /// sequence is dropped before the underscores are removed.
    pub fn object_id_for(&self, output_file_name: &str) -> String {
        if let Some(ref id) = self.object_id {
            return id.clone();
        }
        match self.naming {
            OutputNaming::ObjectDirectory => derive_object_id(output_file_name),
            OutputNaming::FirstImage => {
                let stem = output_file_name
                    .strip_suffix(OUTPUT_SUFFIX)
                    .unwrap_or(output_file_name);
                let object = match stem.rsplit_once('_') {
                    Some((head, page))
                        if !head.is_empty()
                            && !page.is_empty()
                            && page.bytes().all(|b| b.is_ascii_digit()) =>
                    {
                        head
                    }
                    _ => stem,
                };
                derive_object_id(object)
            }
        }
    }
}

/// Derive the dump object id from an output filename: the stem before
/// [`OUTPUT_SUFFIX`] with every underscore removed.
///
/// ```rust
/// use alto_searchable_pdf::config::derive_object_id;
/// assert_eq!(derive_object_id("MMTUK04_210988001_pdf.pdf"), "MMTUK04210988001");
/// ```
pub fn derive_object_id(output_file_name: &str) -> String {
    output_file_name
        .strip_suffix(OUTPUT_SUFFIX)
        .unwrap_or(output_file_name)
        .replace('_', "")
}

/// Builder for [`PipelineConfig`].
#[derive(Debug)]
pub struct PipelineConfigBuilder {
    config: PipelineConfig,
}

impl PipelineConfigBuilder {
    pub fn layout_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.config.layout_suffix = suffix.into();
        self
    }

    pub fn image_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.config.image_suffix = suffix.into();
        self
    }

    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.output_dir = dir.into();
        self
    }

    pub fn scratch_root(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.scratch_root = dir.into();
        self
    }

    pub fn stylesheet(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.stylesheet = path.into();
        self
    }

    pub fn transform(mut self, command: ToolCommand) -> Self {
        self.config.transform = command;
        self
    }

    pub fn assemble(mut self, command: ToolCommand) -> Self {
        self.config.assemble = command;
        self
    }

    pub fn image_backend(mut self, backend: ImageBackend) -> Self {
        self.config.image_backend = backend;
        self
    }

    pub fn naming(mut self, naming: OutputNaming) -> Self {
        self.config.naming = naming;
        self
    }

    pub fn object_id(mut self, id: impl Into<String>) -> Self {
        self.config.object_id = Some(id.into());
        self
    }

    pub fn tool_timeout_secs(mut self, secs: u64) -> Self {
        self.config.tool_timeout_secs = secs;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<PipelineConfig, SearchablePdfError> {
        let c = &self.config;
        if c.layout_suffix.is_empty() || c.image_suffix.is_empty() {
            return Err(SearchablePdfError::InvalidConfig(
                "layout and image suffixes must be non-empty".into(),
            ));
        }
        if c.layout_suffix == c.image_suffix {
            return Err(SearchablePdfError::InvalidConfig(format!(
                "layout and image suffix are both '{}'",
                c.layout_suffix
            )));
        }
        if c.tool_timeout_secs == 0 {
            return Err(SearchablePdfError::InvalidConfig(
                "tool timeout must be ≥ 1 second".into(),
            ));
        }
        for (name, cmd) in [("transform", &c.transform), ("assemble", &c.assemble)] {
            if cmd.program.trim().is_empty() {
                return Err(SearchablePdfError::InvalidConfig(format!(
                    "{name} program is empty"
                )));
            }
        }
        if let Some(ref id) = c.object_id {
            if id.trim().is_empty() {
                return Err(SearchablePdfError::InvalidConfig("object id is empty".into()));
            }
        }
        Ok(self.config)
    }
}

// ── External commands ────────────────────────────────────────────────────

/// A program plus argument template.
///
/// Arguments may contain `{input}`, `{output}`, `{stylesheet}` and `{dir}`
/// placeholders, substituted per invocation by [`ToolCommand::render_args`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl ToolCommand {
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// Saxon-HE XSLT 2.0 transform through `java -cp <jar>`.
    pub fn saxon(java: impl Into<String>, jar: impl AsRef<Path>) -> Self {
        Self::new(
            java,
            [
                "-cp".to_string(),
                jar.as_ref().to_string_lossy().into_owned(),
                "net.sf.saxon.Transform".to_string(),
                "-t".to_string(),
                "-s:{input}".to_string(),
                "-xsl:{stylesheet}".to_string(),
                "-o:{output}".to_string(),
            ],
        )
    }

    /// `hocr-pdf <dir>`, PDF written to stdout.
    pub fn hocr_pdf(program: impl Into<String>) -> Self {
        Self::new(program, ["{dir}"])
    }

    /// ImageMagick-style `<program> <input> <output>`.
    pub fn image_magick(program: impl Into<String>) -> Self {
        Self::new(program, ["{input}", "{output}"])
    }

    /// Substitute placeholders. Unknown placeholders are left untouched.
    pub fn render_args(&self, vars: &[(&str, &Path)]) -> Vec<OsString> {
        self.args
            .iter()
            .map(|arg| {
                // Whole-argument placeholders keep non-UTF-8 paths intact.
                for (name, value) in vars {
                    if arg.len() == name.len() + 2
                        && arg.starts_with('{')
                        && arg.ends_with('}')
                        && &arg[1..arg.len() - 1] == *name
                    {
                        return value.as_os_str().to_os_string();
                    }
                }
                let mut rendered = arg.clone();
                for (name, value) in vars {
                    let key = format!("{{{name}}}");
                    if rendered.contains(&key) {
                        rendered = rendered.replace(&key, &value.to_string_lossy());
                    }
                }
                OsString::from(rendered)
            })
            .collect()
    }
}

impl fmt::Display for ToolCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// How page scans are converted to JPEG working copies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageBackend {
    /// In-process via the `image` crate when it recognises the input format,
    /// otherwise the given external command. (default)
    Auto(ToolCommand),
    /// Always in-process. Fails on formats the `image` crate cannot decode.
    Native,
    /// Always the given external command.
    External(ToolCommand),
}

impl Default for ImageBackend {
    fn default() -> Self {
        ImageBackend::Auto(ToolCommand::image_magick("magick"))
    }
}

/// How the output filename (and thus the default object id) is derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OutputNaming {
    /// `<object directory name>_pdf.pdf`. (default)
    #[default]
    ObjectDirectory,
    /// `<first page stem>_pdf.pdf`, taken from the first discovered scan.
    /// The derived object id drops the page sequence, so
    /// `MMECAL02_179966004_00001` still resolves `MMECAL02179966004`.
    FirstImage,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_delivery_layout() {
        let c = PipelineConfig::default();
        assert_eq!(c.layout_suffix, "_alto.xml");
        assert_eq!(c.image_suffix, "_access.jp2");
        assert_eq!(c.tool_timeout_secs, 300);
        assert_eq!(c.naming, OutputNaming::ObjectDirectory);
    }

    #[test]
    fn build_rejects_equal_suffixes() {
        let err = PipelineConfig::builder()
            .layout_suffix(".xml")
            .image_suffix(".xml")
            .build()
            .unwrap_err();
        assert!(err.to_string().contains(".xml"));
    }

    #[test]
    fn build_rejects_zero_timeout() {
        assert!(PipelineConfig::builder().tool_timeout_secs(0).build().is_err());
    }

    #[test]
    fn object_id_strips_suffix_and_underscores() {
        assert_eq!(derive_object_id("MMTUK04_210988001_pdf.pdf"), "MMTUK04210988001");
        assert_eq!(derive_object_id("MMKB08_000000001"), "MMKB08000000001");
    }

    #[test]
    fn explicit_object_id_wins() {
        let c = PipelineConfig::builder().object_id("ABC123").build().unwrap();
        assert_eq!(c.object_id_for("MMTUK04_210988001_pdf.pdf"), "ABC123");
    }

    #[test]
    fn output_name_from_object_directory() {
        let c = PipelineConfig::default();
        let name = c.output_file_name(
            Path::new("/data/MMECAL02_179966004"),
            Path::new("/data/MMECAL02_179966004/x/MMECAL02_179966004_00001_access.jp2"),
        );
        assert_eq!(name, "MMECAL02_179966004_pdf.pdf");
    }

    #[test]
    fn output_name_from_first_image() {
        let c = PipelineConfig::builder()
            .naming(OutputNaming::FirstImage)
            .build()
            .unwrap();
        let name = c.output_file_name(
            Path::new("/data/batch"),
            Path::new("/data/batch/MMECAL02_179966004_00001_access.jp2"),
        );
        assert_eq!(name, "MMECAL02_179966004_00001_pdf.pdf");
    }

    #[test]
    fn first_image_object_id_drops_page_sequence() {
        let c = PipelineConfig::builder()
            .naming(OutputNaming::FirstImage)
            .build()
            .unwrap();
        let name = c.output_file_name(
            Path::new("/data/batch"),
            Path::new("/data/batch/MMECAL02_179966004_00001_access.jp2"),
        );
        assert_eq!(c.object_id_for(&name), "MMECAL02179966004");
        assert_eq!(c.object_id_for("SINGLE_pdf.pdf"), "SINGLE");
    }

    #[test]
    fn saxon_args_render_placeholders() {
        let cmd = ToolCommand::saxon("java", "saxon9he.jar");
        let args = cmd.render_args(&[
            ("input", Path::new("/in/p1_alto.xml")),
            ("output", Path::new("/tmp/p1.hocr")),
            ("stylesheet", Path::new("alto2hocr.xsl")),
        ]);
        let args: Vec<String> = args
            .into_iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            args,
            vec![
                "-cp",
                "saxon9he.jar",
                "net.sf.saxon.Transform",
                "-t",
                "-s:/in/p1_alto.xml",
                "-xsl:alto2hocr.xsl",
                "-o:/tmp/p1.hocr",
            ]
        );
    }

    #[test]
    fn whole_placeholder_passes_path_through() {
        let cmd = ToolCommand::hocr_pdf("hocr-pdf");
        let args = cmd.render_args(&[("dir", Path::new("/scratch/pages"))]);
        assert_eq!(args, vec![OsString::from("/scratch/pages")]);
    }
}
