mod common;

use common::{FakeRasterizer, FakeSource, RecordingHost};
use flipbook_core::{
    CaptureChoice, CaptureRequest, DeviceClass, ExportError, FlipGesture, FlipOutcome,
    FlipStatus, LoadError, NavStep, NoHost, PageReadout, PageSurface, RasterAdapter,
    ShareOutcome, Side, SourceRef, SpreadSelection, Viewer, ViewerConfig, ViewportSize,
    VisibleSpread,
};
use pretty_assertions::assert_eq;
use std::sync::Arc;
use std::time::{Duration, Instant};

const DESKTOP: ViewportSize = ViewportSize {
    container_width: 1200.0,
    viewport_height: 900.0,
};
const MOBILE: ViewportSize = ViewportSize {
    container_width: 420.0,
    viewport_height: 900.0,
};

fn config() -> ViewerConfig {
    ViewerConfig::default()
        .with_aspect_ratio(1.41)
        .with_margins(10.0, 30.0)
        .with_reserved_chrome_height(160.0)
        .with_export_stagger_ms(0)
}

async fn open_with(
    rasterizer: Arc<FakeRasterizer>,
    viewport: ViewportSize,
    config: ViewerConfig,
) -> Viewer<Arc<FakeRasterizer>> {
    Viewer::open(
        &FakeSource::pages(10),
        "edition-2024-05-01",
        SourceRef::new("https://cdn.example.com/editions/2024-05-01.pdf"),
        rasterizer,
        config,
        viewport,
    )
    .await
    .expect("document loads")
}

async fn open(viewport: ViewportSize) -> Viewer<Arc<FakeRasterizer>> {
    open_with(Arc::new(FakeRasterizer::default()), viewport, config()).await
}

/// Navigates to a 1-based page and lets the flip finish.
fn turn_to(viewer: &mut Viewer<Arc<FakeRasterizer>>, page: i64) {
    assert!(viewer.go_to_page(page, Instant::now()).started());
    viewer.finish_flip();
}

#[tokio::test]
async fn initial_layout_matches_viewport() {
    let viewer = open(DESKTOP).await;
    let layout = viewer.layout().expect("layout after mount");

    assert_eq!(layout.device_class, DeviceClass::Desktop);
    assert_eq!(layout.page_width, 524);
    assert_eq!(
        viewer.page_readout(),
        PageReadout {
            current: 1,
            total: 10
        }
    );
    assert_eq!(viewer.visible_spread(), Some(VisibleSpread::Single(1)));
}

#[tokio::test]
async fn load_failure_is_terminal() {
    let result = Viewer::open(
        &FakeSource::failing(),
        "missing",
        SourceRef::new("https://cdn.example.com/missing.pdf"),
        FakeRasterizer::default(),
        config(),
        DESKTOP,
    )
    .await;

    assert!(matches!(result, Err(LoadError::Unreachable(_))));
}

#[tokio::test]
async fn spread_export_offers_both_sides() {
    let mut viewer = open(DESKTOP).await;
    turn_to(&mut viewer, 4);
    assert_eq!(viewer.current_index(), 3);

    let request = viewer.capture_current().unwrap();
    let CaptureRequest::NeedsSelection(selection) = request else {
        panic!("spread must not be captured silently");
    };
    assert_eq!(
        selection,
        SpreadSelection {
            left: 4,
            right: Some(5)
        }
    );
    assert_eq!(
        selection.options(),
        vec![CaptureChoice::Left, CaptureChoice::Right, CaptureChoice::Both]
    );

    // Nothing rendered yet
    assert_eq!(
        viewer.capture_selection(&selection, CaptureChoice::Left),
        Err(ExportError::NotRendered(4))
    );

    viewer.render_visible().await;
    let artifacts = viewer
        .capture_selection(&selection, CaptureChoice::Both)
        .unwrap();
    let names: Vec<_> = artifacts.iter().map(|a| a.file_name.clone()).collect();
    assert_eq!(
        names,
        vec![
            "edition-2024-05-01-page-4.png".to_string(),
            "edition-2024-05-01-page-5.png".to_string()
        ]
    );

    let mut host = RecordingHost::default();
    viewer.exporter().deliver(&artifacts, &mut host).await.unwrap();
    assert_eq!(host.saved.len(), 2);
}

#[tokio::test]
async fn last_page_spread_has_no_right_option() {
    let mut viewer = open(DESKTOP).await;
    turn_to(&mut viewer, 10);

    let CaptureRequest::NeedsSelection(selection) = viewer.capture_current().unwrap() else {
        panic!("last desktop page is still a spread");
    };
    assert_eq!(selection.right, None);
    assert_eq!(selection.options(), vec![CaptureChoice::Left]);
}

#[tokio::test]
async fn single_page_exports_immediately() {
    let viewer = open(MOBILE).await;
    viewer.render_visible().await;

    let CaptureRequest::Captured(artifact) = viewer.capture_current().unwrap() else {
        panic!("mobile shows one page");
    };
    assert_eq!(artifact.page_number, 1);
    assert_eq!(artifact.file_name, "edition-2024-05-01-page-1.png");
}

#[tokio::test]
async fn stale_selection_is_rejected() {
    let mut viewer = open(DESKTOP).await;
    turn_to(&mut viewer, 4);
    let CaptureRequest::NeedsSelection(selection) = viewer.capture_current().unwrap() else {
        panic!("expected spread");
    };

    turn_to(&mut viewer, 6);
    assert_eq!(
        viewer.capture_selection(&selection, CaptureChoice::Left),
        Err(ExportError::NotVisible(4))
    );
}

#[tokio::test]
async fn failing_page_is_isolated() {
    let rasterizer = Arc::new(FakeRasterizer::failing_on(&[7]));
    let mut viewer = open_with(Arc::clone(&rasterizer), DESKTOP, config()).await;

    let rasters = viewer.rasters();
    for (page, width) in viewer.render_plan() {
        let result = rasters.ensure_rendered(page, width).await;
        assert_eq!(result.is_err(), page == 7);
    }

    for page in (1..=10).filter(|&page| page != 7) {
        assert!(matches!(viewer.page_view(page), PageSurface::Ready(_)));
    }
    assert!(matches!(viewer.page_view(7), PageSurface::Failed(_)));

    turn_to(&mut viewer, 7);
    assert_eq!(
        viewer.visible_spread(),
        Some(VisibleSpread::Pair {
            left: 6,
            right: Some(7)
        })
    );
    let CaptureRequest::NeedsSelection(selection) = viewer.capture_current().unwrap() else {
        panic!("expected spread");
    };
    assert!(viewer
        .capture_selection(&selection, CaptureChoice::Left)
        .is_ok());
    assert_eq!(
        viewer.capture_selection(&selection, CaptureChoice::Right),
        Err(ExportError::RenderFailed(7))
    );

    // Neighbours keep flipping
    assert!(viewer
        .flip_gesture(FlipGesture::CornerClick(Side::Right), Instant::now())
        .started());
    viewer.finish_flip();
    assert_eq!(viewer.current_index(), 7);
}

#[tokio::test]
async fn render_plan_puts_visible_pages_first() {
    let mut viewer = open(DESKTOP).await;
    turn_to(&mut viewer, 6);

    let plan = viewer.render_plan();
    let pages: Vec<u32> = plan.iter().map(|&(page, _)| page).collect();
    assert_eq!(pages[..2].to_vec(), vec![6, 7]);
    assert_eq!(pages[2..4].to_vec(), vec![5, 8]);
    assert_eq!(pages.len(), 10);
    assert!(plan.iter().all(|&(_, width)| width == 524));
}

#[tokio::test]
async fn duplicate_requests_share_one_render() {
    let rasterizer = Arc::new(FakeRasterizer::default());
    let rasters = RasterAdapter::new(Arc::clone(&rasterizer), 10);

    let (a, b, c) = tokio::join!(
        rasters.ensure_rendered(3, 400),
        rasters.ensure_rendered(3, 400),
        rasters.ensure_rendered(3, 400),
    );

    assert_eq!(rasterizer.calls(), 1);
    assert_eq!(a.unwrap(), b.unwrap());
    assert!(c.is_ok());
}

#[tokio::test]
async fn duplicate_requests_share_one_failure() {
    let rasterizer = Arc::new(FakeRasterizer::failing_on(&[7]));
    let rasters = RasterAdapter::new(Arc::clone(&rasterizer), 10);

    let (a, b, c) = tokio::join!(
        rasters.ensure_rendered(7, 400),
        rasters.ensure_rendered(7, 400),
        rasters.ensure_rendered(7, 400),
    );

    assert_eq!(rasterizer.calls(), 1);
    let err = a.unwrap_err();
    assert_eq!(b.unwrap_err(), err);
    assert_eq!(c.unwrap_err(), err);
    assert_eq!(err.page_number, 7);

    // A request after the failure settled tries again
    assert!(rasters.ensure_rendered(7, 400).await.is_err());
    assert_eq!(rasterizer.calls(), 2);
}

#[tokio::test]
async fn zoom_blocks_flip_gestures() {
    let mut viewer = open(DESKTOP).await;
    let mut zoom = viewer.subscribe_zoom();

    viewer.zoom_in();
    assert!(viewer.input_lock().is_locked());
    assert!(zoom.borrow_and_update().locked);

    let now = Instant::now();
    assert_eq!(
        viewer.flip_gesture(FlipGesture::CornerClick(Side::Right), now),
        FlipOutcome::Locked
    );
    assert_eq!(
        viewer.flip_gesture(FlipGesture::Drag { dx: -200.0 }, now),
        FlipOutcome::Locked
    );
    assert_eq!(viewer.current_index(), 0);

    // Buttons stay available by default
    assert!(viewer.navigate(NavStep::Next, now).started());
    viewer.finish_flip();
    assert_eq!(viewer.current_index(), 1);

    viewer.reset_zoom();
    assert!(!zoom.borrow_and_update().locked);
    assert!(viewer
        .flip_gesture(FlipGesture::CornerClick(Side::Right), now)
        .started());
}

#[tokio::test]
async fn buttons_can_be_locked_while_zoomed() {
    let mut viewer = open_with(
        Arc::new(FakeRasterizer::default()),
        DESKTOP,
        config().with_navigation_while_zoomed(false),
    )
    .await;

    viewer.zoom_in();
    assert_eq!(
        viewer.navigate(NavStep::Next, Instant::now()),
        FlipOutcome::Locked
    );
    assert_eq!(viewer.current_index(), 0);
}

#[tokio::test]
async fn resize_does_not_interrupt_flip() {
    let mut viewer = open(DESKTOP).await;
    let start = Instant::now();

    assert!(viewer.navigate(NavStep::NextSpread, start).started());
    viewer.resize(MOBILE, start);

    let report = viewer.tick(start + Duration::from_millis(200));
    let layout = report.layout.expect("debounced layout applied");
    assert_eq!(layout.device_class, DeviceClass::Mobile);
    assert_eq!(report.committed, None);
    assert!(matches!(viewer.flip_status(), FlipStatus::Animating(_)));

    let report = viewer.tick(start + Duration::from_millis(800));
    assert_eq!(report.committed, Some(1));
    assert_eq!(viewer.visible_spread(), Some(VisibleSpread::Single(2)));
    assert_eq!(viewer.page_readout().current, 2);
}

#[tokio::test]
async fn degenerate_resize_keeps_layout() {
    let mut viewer = open(DESKTOP).await;
    let before = viewer.layout();
    let start = Instant::now();

    viewer.resize(ViewportSize::new(0.0, 900.0), start);
    let report = viewer.tick(start + Duration::from_secs(1));

    assert_eq!(report.layout, None);
    assert_eq!(viewer.layout(), before);
}

#[tokio::test]
async fn device_class_change_resets_zoom() {
    let mut viewer = open(DESKTOP).await;
    viewer.zoom_in();
    assert!(viewer.input_lock().is_locked());

    let start = Instant::now();
    viewer.resize(MOBILE, start);
    viewer.tick(start + Duration::from_secs(1));

    assert_eq!(viewer.transform().scale, 1.0);
    assert!(!viewer.input_lock().is_locked());
}

#[tokio::test]
async fn width_change_rerenders_visible_pages() {
    let rasterizer = Arc::new(FakeRasterizer::default());
    let mut viewer = open_with(Arc::clone(&rasterizer), DESKTOP, config()).await;

    viewer.render_visible().await;
    viewer.render_visible().await;
    assert_eq!(rasterizer.calls(), 1);

    let start = Instant::now();
    viewer.resize(ViewportSize::new(1000.0, 900.0), start);
    viewer.tick(start + Duration::from_secs(1));
    let results = viewer.render_visible().await;

    assert_eq!(rasterizer.calls(), 2);
    let handle = results[0].as_ref().unwrap();
    assert_eq!(handle.width(), viewer.layout().unwrap().page_width);
}

#[tokio::test]
async fn page_readout_is_published_on_commit() {
    let mut viewer = open(MOBILE).await;
    let mut pages = viewer.subscribe_pages();

    viewer.navigate(NavStep::Last, Instant::now());
    assert!(!pages.has_changed().unwrap());

    viewer.finish_flip();
    assert!(pages.has_changed().unwrap());
    assert_eq!(
        *pages.borrow_and_update(),
        PageReadout {
            current: 10,
            total: 10
        }
    );
}

#[tokio::test]
async fn share_falls_back_to_clipboard() {
    let mut viewer = open(MOBILE).await;
    turn_to(&mut viewer, 3);

    let mut host = RecordingHost::default();
    assert_eq!(viewer.share(&mut host), Ok(ShareOutcome::CopiedLink));
    assert_eq!(
        host.clipboard.as_deref(),
        Some("https://cdn.example.com/editions/2024-05-01.pdf")
    );

    let mut host = RecordingHost {
        can_share: true,
        ..RecordingHost::default()
    };
    assert_eq!(viewer.share(&mut host), Ok(ShareOutcome::Shared));
    assert_eq!(
        host.shared[0].text,
        "Read the digital edition of Morning Edition. I'm on page 3."
    );
}

#[tokio::test]
async fn fullscreen_is_optional() {
    let viewer = open(MOBILE).await;
    let mut host = RecordingHost::default();
    assert!(viewer.toggle_fullscreen(&mut host).is_err());
}

#[tokio::test]
async fn download_link_is_named_after_document() {
    let viewer = open(MOBILE).await;
    let link = viewer.download_link();
    assert_eq!(link.file_name, "edition-2024-05-01.pdf");
    assert_eq!(link.url, "https://cdn.example.com/editions/2024-05-01.pdf");
}

#[tokio::test]
async fn close_releases_rasters() {
    let viewer = open(DESKTOP).await;
    viewer.render_visible().await;

    assert_eq!(viewer.close(), 1);
}

#[tokio::test]
async fn delivery_without_download_sink_is_unavailable() {
    let viewer = open(MOBILE).await;
    viewer.render_visible().await;

    let CaptureRequest::Captured(artifact) = viewer.capture_current().unwrap() else {
        panic!("cover is captured directly");
    };
    let result = viewer
        .exporter()
        .deliver(&[artifact], &mut NoHost)
        .await;
    assert!(matches!(result, Err(ExportError::Unavailable(_))));
}

#[tokio::test]
async fn empty_document_has_nothing_to_capture() {
    let viewer = Viewer::open(
        &FakeSource::pages(0),
        "blank",
        SourceRef::new("https://cdn.example.com/editions/blank.pdf"),
        Arc::new(FakeRasterizer::default()),
        config(),
        DESKTOP,
    )
    .await
    .unwrap();

    assert_eq!(viewer.visible_spread(), None);
    assert!(matches!(
        viewer.capture_current(),
        Err(ExportError::Unavailable(_))
    ));
}
