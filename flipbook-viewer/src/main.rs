use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use flipbook_core::{
    CaptureChoice, CaptureRequest, ExportFormat, FlipGesture, FlipOutcome, NavStep, PageSurface,
    Side, SourceRef, Viewer, ViewerConfig, ViewportSize,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

mod host;
mod renderer;

use host::TerminalHost;
use renderer::PageDirectory;

#[derive(Debug, Parser)]
#[command(name = "flipbook-viewer", version, about = "Read and export paged documents")]
struct Cli {
    /// Directory holding one image per page
    document: PathBuf,

    /// Document id used for exported file names, defaults to the directory name
    #[arg(long)]
    id: Option<String>,

    /// JSON viewer configuration
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long, default_value_t = 1200.0)]
    width: f32,

    #[arg(long, default_value_t = 900.0)]
    height: f32,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the page layout for the viewport
    Layout,
    /// Run a comma separated list of reader actions
    Read {
        /// e.g. "next,next,zoom-in,corner-right,reset,page:7,resize:600x800"
        #[arg(long, default_value = "next")]
        script: String,
    },
    /// Export the spread showing a page
    Export {
        #[arg(long, default_value_t = 1)]
        page: i64,
        #[arg(long, value_enum, default_value_t = ChoiceArg::Both)]
        choice: ChoiceArg,
        #[arg(long, value_enum)]
        format: Option<FormatArg>,
        #[arg(long, default_value = "downloads")]
        out: PathBuf,
    },
    /// Share the current page, or print its link
    Share,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ChoiceArg {
    Left,
    Right,
    Both,
}

impl From<ChoiceArg> for CaptureChoice {
    fn from(choice: ChoiceArg) -> Self {
        match choice {
            ChoiceArg::Left => CaptureChoice::Left,
            ChoiceArg::Right => CaptureChoice::Right,
            ChoiceArg::Both => CaptureChoice::Both,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum FormatArg {
    Png,
    Jpeg,
}

impl From<FormatArg> for ExportFormat {
    fn from(format: FormatArg) -> Self {
        match format {
            FormatArg::Png => ExportFormat::Png,
            FormatArg::Jpeg => ExportFormat::Jpeg,
        }
    }
}

/// One reader action, as a toolbar or pointer would send it.
#[derive(Debug, Clone, PartialEq)]
enum Message {
    Navigate(NavStep),
    Gesture(FlipGesture),
    ZoomIn,
    ZoomOut,
    ZoomReset,
    Wheel(f32),
    Pan(f32, f32),
    Resize(f32, f32),
    Fullscreen,
}

impl Message {
    /// Navigation to a 1-based page number.
    fn page(page: i64) -> Self {
        Message::Navigate(NavStep::Index(page.saturating_sub(1)))
    }

    fn parse(token: &str) -> Result<Self> {
        let message = match token.trim() {
            "next" => Message::Navigate(NavStep::Next),
            "prev" => Message::Navigate(NavStep::Prev),
            "next-spread" => Message::Navigate(NavStep::NextSpread),
            "prev-spread" => Message::Navigate(NavStep::PrevSpread),
            "first" => Message::Navigate(NavStep::First),
            "last" => Message::Navigate(NavStep::Last),
            "corner-left" => Message::Gesture(FlipGesture::CornerClick(Side::Left)),
            "corner-right" => Message::Gesture(FlipGesture::CornerClick(Side::Right)),
            "zoom-in" => Message::ZoomIn,
            "zoom-out" => Message::ZoomOut,
            "reset" => Message::ZoomReset,
            "fullscreen" => Message::Fullscreen,
            other => return Self::parse_with_argument(other),
        };
        Ok(message)
    }

    fn parse_with_argument(token: &str) -> Result<Self> {
        let Some((name, value)) = token.split_once(':') else {
            bail!("unknown action `{token}`");
        };
        let message = match name {
            "page" => {
                Message::page(value.parse().context("page number")?)
            }
            "drag" => Message::Gesture(FlipGesture::Drag {
                dx: value.parse().context("drag distance")?,
            }),
            "wheel" => Message::Wheel(value.parse().context("wheel delta")?),
            "pan" => {
                let (dx, dy) = value.split_once('x').context("pan takes DXxDY")?;
                Message::Pan(dx.parse()?, dy.parse()?)
            }
            "resize" => {
                let (w, h) = value.split_once('x').context("resize takes WxH")?;
                Message::Resize(w.parse()?, h.parse()?)
            }
            _ => bail!("unknown action `{token}`"),
        };
        Ok(message)
    }
}

struct Session {
    viewer: Viewer<Arc<PageDirectory>>,
    host: TerminalHost,
    /// Simulated clock, advanced past every animation and debounce window
    clock: Instant,
}

impl Session {
    async fn open(cli: &Cli, config: ViewerConfig, download_dir: PathBuf) -> Result<Self> {
        let pages = Arc::new(PageDirectory::new());
        let id = match &cli.id {
            Some(id) => id.clone(),
            None => cli
                .document
                .file_name()
                .and_then(|name| name.to_str())
                .unwrap_or("document")
                .to_string(),
        };
        let reference = SourceRef::new(cli.document.to_string_lossy());

        let viewer = Viewer::open(
            pages.as_ref(),
            id,
            reference,
            Arc::clone(&pages),
            config,
            ViewportSize::new(cli.width, cli.height),
        )
        .await
        .with_context(|| format!("failed to open {}", cli.document.display()))?;

        let session = Self {
            viewer,
            host: TerminalHost::new(download_dir),
            clock: Instant::now(),
        };
        session.render().await;
        Ok(session)
    }

    async fn update(&mut self, message: Message) {
        tracing::debug!(?message, "update");
        match message {
            Message::Navigate(step) => {
                let outcome = self.viewer.navigate(step, self.clock);
                self.settle(outcome);
            }
            Message::Gesture(gesture) => {
                let outcome = self.viewer.flip_gesture(gesture, self.clock);
                self.settle(outcome);
            }
            Message::ZoomIn => self.viewer.zoom_in(),
            Message::ZoomOut => self.viewer.zoom_out(),
            Message::ZoomReset => self.viewer.reset_zoom(),
            Message::Wheel(delta) => {
                let focal = self.focal_point();
                self.viewer.wheel(delta, focal);
            }
            Message::Pan(dx, dy) => self.viewer.pan(dx, dy),
            Message::Resize(width, height) => {
                self.viewer.resize(ViewportSize::new(width, height), self.clock);
                self.clock += self.viewer.config().resize_debounce();
                if let Some(layout) = self.viewer.tick(self.clock).layout {
                    println!(
                        "layout: {:?} {}x{:.0}",
                        layout.device_class, layout.page_width, layout.page_height
                    );
                }
            }
            Message::Fullscreen => match self.viewer.toggle_fullscreen(&mut self.host) {
                Ok(on) => println!("fullscreen: {on}"),
                Err(e) => tracing::warn!("fullscreen unavailable: {}", e),
            },
        }
        self.render().await;
        self.print_status();
    }

    /// Runs a started flip to completion on the simulated clock.
    fn settle(&mut self, outcome: FlipOutcome) {
        if !outcome.started() {
            println!("flip: {outcome:?}");
            return;
        }
        self.clock += self.viewer.config().flip_duration();
        self.viewer.tick(self.clock);
    }

    async fn render(&self) {
        for result in self.viewer.render_visible().await {
            if let Err(e) = result {
                tracing::error!("Failed to render page {}: {}", e.page_number, e.reason);
            }
        }
    }

    fn focal_point(&self) -> (f32, f32) {
        self.viewer
            .layout()
            .map_or((0.0, 0.0), |layout| {
                (layout.page_width as f32 / 2.0, layout.page_height / 2.0)
            })
    }

    fn print_status(&self) {
        let readout = self.viewer.page_readout();
        let zoom = *self.viewer.subscribe_zoom().borrow();
        let surfaces: Vec<String> = self
            .viewer
            .visible_spread()
            .map(|spread| spread.pages())
            .unwrap_or_default()
            .into_iter()
            .map(|page| match self.viewer.page_view(page) {
                PageSurface::Ready(handle) => {
                    let (w, h) = handle.pixel_size();
                    format!("{page}:{w}x{h}")
                }
                PageSurface::Pending => format!("{page}:pending"),
                PageSurface::Failed(_) => format!("{page}:unavailable"),
            })
            .collect();

        println!(
            "Page {} of {} | zoom {}%{} | {}",
            readout.current,
            readout.total,
            zoom.percent,
            if zoom.locked { " (flip locked)" } else { "" },
            surfaces.join(" ")
        );
    }
}

fn load_config(cli: &Cli) -> Result<ViewerConfig> {
    let config = match &cli.config {
        Some(path) => ViewerConfig::from_path(path)
            .with_context(|| format!("failed to read {}", path.display()))?,
        None => ViewerConfig::default(),
    };
    config.validate()?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "flipbook_viewer=debug,flipbook_core=info".into()),
        )
        .init();

    let cli = Cli::parse();
    let mut config = load_config(&cli)?;

    match &cli.command {
        Command::Layout => {
            let session = Session::open(&cli, config, PathBuf::from(".")).await?;
            match session.viewer.layout() {
                Some(layout) => println!(
                    "{:?}: page {}x{:.1}, spread {:?}",
                    layout.device_class,
                    layout.page_width,
                    layout.page_height,
                    session.viewer.visible_spread()
                ),
                None => println!("viewport too small for a layout"),
            }
            session.viewer.close();
        }
        Command::Read { script } => {
            let messages = script
                .split(',')
                .filter(|token| !token.trim().is_empty())
                .map(Message::parse)
                .collect::<Result<Vec<_>>>()?;

            let mut session = Session::open(&cli, config, PathBuf::from(".")).await?;
            session.print_status();
            for message in messages {
                session.update(message).await;
            }
            session.viewer.close();
        }
        Command::Export {
            page,
            choice,
            format,
            out,
        } => {
            if let Some(format) = format {
                config = config.with_export_format((*format).into());
            }
            let mut session = Session::open(&cli, config, out.clone()).await?;
            session.update(Message::page(*page)).await;

            let artifacts = match session.viewer.capture_current()? {
                CaptureRequest::Captured(artifact) => vec![artifact],
                CaptureRequest::NeedsSelection(selection) => {
                    let choice = CaptureChoice::from(*choice);
                    if !selection.options().contains(&choice) {
                        bail!(
                            "page {} has no facing page, use --choice left",
                            selection.left
                        );
                    }
                    session.viewer.capture_selection(&selection, choice)?
                }
            };

            session
                .viewer
                .exporter()
                .deliver(&artifacts, &mut session.host)
                .await?;
            for path in session.host.saved() {
                println!("{}", path.display());
            }
            session.viewer.close();
        }
        Command::Share => {
            let mut session = Session::open(&cli, config, PathBuf::from(".")).await?;
            let outcome = session.viewer.share(&mut session.host)?;
            tracing::info!(?outcome, "shared");
            let link = session.viewer.download_link();
            println!("download: {} ({})", link.url, link.file_name);
            session.viewer.close();
        }
    }

    Ok(())
}
