//! The interactive two-stage flow.
//!
//! A line-oriented shell over a [`Session`]. The session owns the one
//! current image; every action receives it by `&mut` and nothing else
//! holds it. Opening a new image replaces the previous one outright.
//!
//! ```text
//! open photo.jpg      load an image and show it
//! preset 1            apply built-in stage pair 1: (2, 4)
//! preset 2            apply built-in stage pair 2: (7, 3)
//! apply 11 4          apply an arbitrary stage-1/stage-2 pair
//! help                list actions
//! quit                leave
//! ```

use std::fs;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

use prism_pipeline::{OutputFormat, Raster, StagePair, decode, dispatch_stages, encode};

use crate::error::IoError;

/// Stage pairs bound to the numbered presets, in order.
pub const PRESETS: [StagePair; 2] = [StagePair::from_codes(2, 4), StagePair::from_codes(7, 3)];

/// Title under which a freshly opened image is shown.
pub const ORIGINAL_TITLE: &str = "Original Image";

/// Title under which a processed image is shown.
pub const PROCESSED_TITLE: &str = "Processed Image";

const HELP: &str = "\
actions:
  open <path>         load an image
  preset <n>          apply preset n (1: stages 2 & 4, 2: stages 7 & 3)
  apply <s1> <s2>     apply stage-1 code s1 then stage-2 code s2
  help                show this text
  quit                exit";

/// Shows images to the user.
pub trait Viewer {
    /// Present `image` under `title`.
    ///
    /// # Errors
    ///
    /// Returns an error if the image cannot be presented.
    fn show(&mut self, title: &str, image: &Raster) -> Result<(), IoError>;
}

/// A [`Viewer`] that writes each shown image to `<dir>/<slug>.png`.
///
/// Showing a second image under the same title replaces the file.
#[derive(Debug, Clone)]
pub struct FileViewer {
    dir: PathBuf,
}

impl FileViewer {
    /// A viewer writing into `dir`, created on first use.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The path an image shown under `title` is written to.
    #[must_use]
    pub fn path_for(&self, title: &str) -> PathBuf {
        self.dir.join(format!("{}.png", slug(title)))
    }
}

impl Viewer for FileViewer {
    fn show(&mut self, title: &str, image: &Raster) -> Result<(), IoError> {
        fs::create_dir_all(&self.dir).map_err(|e| IoError::fs("create", &self.dir, e))?;
        let path = self.path_for(title);
        let bytes = encode(image, OutputFormat::Png)?;
        fs::write(&path, bytes).map_err(|e| IoError::fs("write", &path, e))?;
        log::info!("{title}: {}", path.display());
        Ok(())
    }
}

/// Lowercase ASCII words joined by `-`.
fn slug(title: &str) -> String {
    title
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|word| !word.is_empty())
        .map(str::to_ascii_lowercase)
        .collect::<Vec<_>>()
        .join("-")
}

/// The shell's single-owner state.
#[derive(Debug, Default)]
pub struct Session {
    current: Option<Raster>,
    source: Option<PathBuf>,
}

impl Session {
    /// A session with no image open.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The currently loaded image, if any.
    #[must_use]
    pub const fn current(&self) -> Option<&Raster> {
        self.current.as_ref()
    }

    /// Where the current image was loaded from.
    #[must_use]
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// Load the image at `path`, replacing any current image.
    ///
    /// On failure the previous image stays current.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::Fs`] if the file cannot be read and
    /// [`IoError::Pipeline`] if it cannot be decoded.
    pub fn open(&mut self, path: &Path) -> Result<&Raster, IoError> {
        let bytes = fs::read(path).map_err(|e| IoError::fs("read", path, e))?;
        let image = decode(&bytes)?;
        self.source = Some(path.to_path_buf());
        Ok(self.current.insert(image))
    }
}

/// One shell action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Open(PathBuf),
    Apply(StagePair),
    /// 1-based index into [`PRESETS`].
    Preset(usize),
    Help,
    Quit,
}

/// Whether the shell keeps reading after an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

impl Action {
    /// Parse one input line. Blank lines parse to `None`.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::UnknownAction`] for anything that is not one
    /// of the documented actions.
    pub fn parse(line: &str) -> Result<Option<Self>, IoError> {
        let line = line.trim();
        let unknown = || IoError::UnknownAction(line.to_owned());
        let (verb, rest) = line
            .split_once(char::is_whitespace)
            .map_or((line, ""), |(verb, rest)| (verb, rest.trim()));

        let action = match verb.to_ascii_lowercase().as_str() {
            "" => return Ok(None),
            "open" if !rest.is_empty() => Self::Open(PathBuf::from(rest)),
            "apply" => {
                let mut codes = rest.split_whitespace().map(str::parse::<u32>);
                match (codes.next(), codes.next(), codes.next()) {
                    (Some(Ok(stage1)), Some(Ok(stage2)), None) => {
                        Self::Apply(StagePair::from_codes(stage1, stage2))
                    }
                    _ => return Err(unknown()),
                }
            }
            "preset" => Self::Preset(rest.parse().map_err(|_| unknown())?),
            "help" | "?" if rest.is_empty() => Self::Help,
            "quit" | "exit" if rest.is_empty() => Self::Quit,
            _ => return Err(unknown()),
        };
        Ok(Some(action))
    }

    /// Run this action against `session`.
    ///
    /// Applying stages with no image loaded does nothing.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::UnknownPreset`] for a preset number outside
    /// [`PRESETS`], and propagates load, encode and viewer failures.
    pub fn perform(
        self,
        session: &mut Session,
        viewer: &mut dyn Viewer,
        out: &mut dyn Write,
    ) -> Result<Flow, IoError> {
        match self {
            Self::Open(path) => {
                let image = session.open(&path)?;
                viewer.show(ORIGINAL_TITLE, image)?;
            }
            Self::Apply(stages) => apply(session, stages, viewer)?,
            Self::Preset(n) => {
                let stages = n
                    .checked_sub(1)
                    .and_then(|i| PRESETS.get(i))
                    .ok_or(IoError::UnknownPreset(n))?;
                apply(session, *stages, viewer)?;
            }
            Self::Help => {
                writeln!(out, "{HELP}").map_err(|e| IoError::fs("write", Path::new("<output>"), e))?;
            }
            Self::Quit => return Ok(Flow::Quit),
        }
        Ok(Flow::Continue)
    }
}

fn apply(session: &Session, stages: StagePair, viewer: &mut dyn Viewer) -> Result<(), IoError> {
    let Some(image) = session.current() else {
        log::warn!("no image loaded; ignoring {stages}");
        return Ok(());
    };
    let processed = dispatch_stages(&stages, image);
    viewer.show(PROCESSED_TITLE, &processed)
}

/// Read actions from `input` until `quit` or end of input.
///
/// A failing line is reported on `out` and the loop moves on.
///
/// # Errors
///
/// Returns [`IoError::Fs`] only if reading `input` or writing `out` fails.
pub fn run(
    session: &mut Session,
    input: impl BufRead,
    viewer: &mut dyn Viewer,
    out: &mut dyn Write,
) -> Result<(), IoError> {
    let stream = Path::new("<input>");
    for line in input.lines() {
        let line = line.map_err(|e| IoError::fs("read", stream, e))?;
        let result = Action::parse(&line)
            .and_then(|action| action.map_or(Ok(Flow::Continue), |a| a.perform(session, viewer, out)));
        match result {
            Ok(Flow::Quit) => break,
            Ok(Flow::Continue) => {}
            Err(e) => {
                log::warn!("{e}");
                writeln!(out, "error: {e}").map_err(|e| IoError::fs("write", Path::new("<output>"), e))?;
            }
        }
    }
    Ok(())
}
