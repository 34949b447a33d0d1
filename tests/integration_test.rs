use std::path::Path;

use layout_assembler::browser::connect_to_browser_and_page;
use layout_assembler::config::{Config, CONFIG_FILE_NAME};
use layout_assembler::error::{AppError, AppResult, RangeError};
use layout_assembler::infrastructure::{DocumentBackend, InputDriver, MemoryBackend, RegionSelector, Unattended};
use layout_assembler::models::caption::CaptionMode;
use layout_assembler::models::document::ItemKind;
use layout_assembler::models::geometry::RatioRegion;
use layout_assembler::orchestrator::AssemblyOrchestrator;
use layout_assembler::utils::logging;
use tempfile::TempDir;

/// 记录所有调用的输入驱动
#[derive(Default)]
struct RecordingDriver {
    calls: Vec<String>,
}

impl InputDriver for RecordingDriver {
    async fn move_to(&mut self, x: f64, y: f64, _duration_sec: f64) -> AppResult<()> {
        self.calls.push(format!("move {} {}", x, y));
        Ok(())
    }

    async fn mouse_down(&mut self) -> AppResult<()> {
        self.calls.push("down".into());
        Ok(())
    }

    async fn mouse_up(&mut self) -> AppResult<()> {
        self.calls.push("up".into());
        Ok(())
    }

    async fn click(&mut self) -> AppResult<()> {
        self.calls.push("click".into());
        Ok(())
    }

    async fn key_press(&mut self, key: &str) -> AppResult<()> {
        self.calls.push(format!("key {}", key));
        Ok(())
    }

    async fn hotkey(&mut self, keys: &[&str]) -> AppResult<()> {
        self.calls.push(format!("hotkey {}", keys.join("+")));
        Ok(())
    }

    async fn type_text(&mut self, text: &str, _interval_sec: f64) -> AppResult<()> {
        self.calls.push(format!("type {}", text));
        Ok(())
    }

    async fn extent(&mut self) -> AppResult<(f64, f64)> {
        Ok((1000.0, 800.0))
    }
}

/// 返回固定比例区域的选择器
struct FixedSelector(RatioRegion);

impl RegionSelector for FixedSelector {
    async fn select_ratio_region(&mut self) -> AppResult<RatioRegion> {
        Ok(self.0)
    }
}

/// 10 页模板，第 8 页为空白标记页，其余每页一个文本 "p{n}"
async fn write_template(path: &Path) {
    let mut backend = MemoryBackend::new();
    let doc = backend.new_document().await.unwrap();
    for _ in 1..10 {
        backend.add_page(doc).await.unwrap();
    }
    for n in 1..=10 {
        if n == 8 {
            continue;
        }
        let page = backend.page(doc, n).await.unwrap();
        let item = backend
            .add_text_frame(page, layout_assembler::models::Rect::new(10.0, 10.0, 40.0, 200.0))
            .await
            .unwrap();
        backend.type_text(item, &format!("p{}", n)).await.unwrap();
    }
    backend.save(doc, path).await.unwrap();
}

/// 项目目录：a/ 3 张图片 + Credits.txt，b/ 5 张图片
async fn project() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    for (folder, count) in [("a", 3), ("b", 5)] {
        let folder_path = dir.path().join(folder);
        std::fs::create_dir_all(&folder_path).unwrap();
        for i in 1..=count {
            std::fs::write(folder_path.join(format!("{:02}.JPG", i)), b"jpeg").unwrap();
        }
    }
    std::fs::write(dir.path().join("a").join("Credits.txt"), "摄影: 张三\n撰文: 李四\n").unwrap();
    write_template(&dir.path().join("template.indd")).await;
    dir
}

fn config(dir: &Path) -> Config {
    Config {
        project_dir: Some(dir.to_path_buf()),
        template_file: Some("template.indd".to_string()),
        split_page: Some(8),
        target_page: Some(8),
        seed: Some(42),
        settle_ms: 0,
        text_frame_top_left_ratio: Some([0.1, 0.8]),
        text_frame_bottom_right_ratio: Some([0.9, 0.95]),
        ..Config::default()
    }
}

/// 每页文本项目的内容
fn page_texts(backend: &MemoryBackend, doc: layout_assembler::infrastructure::DocumentHandle) -> Vec<Option<String>> {
    backend
        .document(doc)
        .unwrap()
        .pages
        .iter()
        .map(|page| {
            page.items
                .iter()
                .find(|i| i.kind == ItemKind::Text)
                .and_then(|i| i.content.clone())
        })
        .collect()
}

#[tokio::test]
async fn test_full_run_scripted() {
    logging::init(false);
    let dir = project().await;
    let mut backend = MemoryBackend::new();

    let report = AssemblyOrchestrator::new(
        config(dir.path()),
        &mut backend,
        None::<&mut Unattended>,
        None::<&mut Unattended>,
    )
    .run()
    .await
    .unwrap();

    assert_eq!(report.batches, 2);
    assert_eq!(report.images_placed, 8);
    assert_eq!(report.images_skipped, 0);
    assert_eq!(report.captions.len(), 1);
    assert_eq!(report.leading_applied, 1);
    assert_eq!(report.captions[0].batch, "a");
    assert_eq!(report.captions[0].line_count, 2);

    // 所有文档都已关闭
    assert_eq!(backend.open_count(), 0);
    assert!(dir.path().join("start.indd").is_file());
    assert!(dir.path().join("finish.indd").is_file());

    let output = backend.open(&report.output_path).await.unwrap();
    let texts = page_texts(&backend, output);
    assert_eq!(texts.len(), 7 + report.pages_used + 2);

    let expected_prefix: Vec<_> = (1..=7).map(|n| Some(format!("p{}", n))).collect();
    assert_eq!(texts[..7], expected_prefix[..]);
    assert_eq!(texts[texts.len() - 2..], [Some("p9".to_string()), Some("p10".to_string())]);

    // 说明文字在工作文档第一页（原拆分页）
    assert_eq!(texts[7].as_deref(), Some("摄影: 张三\n撰文: 李四"));

    let document = backend.document(output).unwrap();
    let images = document
        .pages
        .iter()
        .flat_map(|p| p.items.iter())
        .filter(|i| i.kind == ItemKind::Image)
        .count();
    assert_eq!(images, 8);

    let caption = document.pages[7]
        .items
        .iter()
        .find(|i| i.kind == ItemKind::Text)
        .unwrap();
    // 比例区域按页面尺寸换算：612 x 792
    assert!((caption.bounds.left - 61.2).abs() < 1e-9);
    assert!(caption.bounds.bottom <= 0.95 * 792.0 + 1e-9);
    assert!(caption.style.leading.is_some());
}

#[tokio::test]
async fn test_same_seed_same_layout() {
    let mut page_counts = Vec::new();
    for _ in 0..2 {
        let dir = project().await;
        let mut backend = MemoryBackend::new();
        let report = AssemblyOrchestrator::new(
            config(dir.path()),
            &mut backend,
            None::<&mut Unattended>,
            None::<&mut Unattended>,
        )
        .run()
        .await
        .unwrap();
        page_counts.push(report.pages_used);
    }
    assert_eq!(page_counts[0], page_counts[1]);
}

#[tokio::test]
async fn test_full_run_pointer_mode() {
    let dir = project().await;
    let mut backend = MemoryBackend::new();
    let mut driver = RecordingDriver::default();

    let report = AssemblyOrchestrator::new(
        Config {
            caption_mode: CaptionMode::Pointer,
            ..config(dir.path())
        },
        &mut backend,
        Some(&mut driver),
        None::<&mut Unattended>,
    )
    .run()
    .await
    .unwrap();

    assert_eq!(report.captions.len(), 1);
    assert_eq!(report.captions[0].item, None);
    assert_eq!(report.leading_applied, 0);

    // 区域按视口尺寸换算：1000 x 800
    let rect = report.captions[0].rect;
    assert_eq!(rect.left, 100.0);
    assert_eq!(rect.right, 900.0);
    assert!(rect.bottom <= 760.0);

    assert_eq!(driver.calls[0], "key t");
    assert_eq!(driver.calls.last().unwrap(), "type 摄影: 张三\n撰文: 李四");
}

#[tokio::test]
async fn test_region_calibration_saved_to_config() {
    let dir = project().await;
    let mut backend = MemoryBackend::new();
    let mut selector = FixedSelector(RatioRegion::new((0.2, 0.7), (0.8, 0.9)));

    let mut orchestrator = AssemblyOrchestrator::new(
        Config {
            text_frame_top_left_ratio: None,
            text_frame_bottom_right_ratio: None,
            ..config(dir.path())
        },
        &mut backend,
        None::<&mut Unattended>,
        Some(&mut selector),
    );
    orchestrator.run().await.unwrap();
    assert_eq!(orchestrator.config().text_frame_top_left_ratio, Some([0.2, 0.7]));

    let saved = Config::load(&dir.path().join(CONFIG_FILE_NAME)).await.unwrap();
    assert_eq!(
        saved.ratio_region(),
        Some(RatioRegion::new((0.2, 0.7), (0.8, 0.9)))
    );
}

#[tokio::test]
async fn test_missing_region_without_selector_fails() {
    let dir = project().await;
    let mut backend = MemoryBackend::new();

    let err = AssemblyOrchestrator::new(
        Config {
            text_frame_top_left_ratio: None,
            text_frame_bottom_right_ratio: None,
            ..config(dir.path())
        },
        &mut backend,
        None::<&mut Unattended>,
        None::<&mut Unattended>,
    )
    .run()
    .await
    .unwrap_err();

    assert!(err.is_fatal());
    assert_eq!(backend.open_count(), 0);
    assert!(!dir.path().join("start.indd").exists());
}

#[tokio::test]
async fn test_invalid_split_page_aborts_before_mutation() {
    for pivot in [0, 11, -3] {
        let dir = project().await;
        let mut backend = MemoryBackend::new();

        let err = AssemblyOrchestrator::new(
            Config {
                split_page: Some(pivot),
                ..config(dir.path())
            },
            &mut backend,
            None::<&mut Unattended>,
            None::<&mut Unattended>,
        )
        .run()
        .await
        .unwrap_err();

        assert!(matches!(
            err,
            AppError::Range(RangeError::PivotOutOfRange { .. })
        ));
        assert_eq!(backend.open_count(), 0);
        assert!(!dir.path().join("start.indd").exists());
        assert!(!dir.path().join("merged_output.indd").exists());
    }
}

#[tokio::test]
async fn test_failed_fragment_save_closes_split_documents() {
    let dir = project().await;
    // start.indd 被目录占用，保存前段失败
    std::fs::create_dir_all(dir.path().join("start.indd")).unwrap();
    let mut backend = MemoryBackend::new();

    let err = AssemblyOrchestrator::new(
        config(dir.path()),
        &mut backend,
        None::<&mut Unattended>,
        None::<&mut Unattended>,
    )
    .run()
    .await
    .unwrap_err();

    assert!(matches!(err, AppError::Backend(_)));
    assert_eq!(backend.open_count(), 0);
    assert!(!dir.path().join("merged_output.indd").exists());
}

#[tokio::test]
async fn test_pointer_mode_requires_driver() {
    let dir = project().await;
    let mut backend = MemoryBackend::new();

    let result = AssemblyOrchestrator::new(
        Config {
            caption_mode: CaptionMode::Pointer,
            ..config(dir.path())
        },
        &mut backend,
        None::<&mut Unattended>,
        None::<&mut Unattended>,
    )
    .run()
    .await;

    assert!(matches!(result, Err(AppError::Config(_))));
}

#[tokio::test]
#[ignore] // 默认忽略，需要手动运行：cargo test -- --ignored
async fn test_browser_connection() {
    logging::init(true);

    let port: u16 = std::env::var("BROWSER_DEBUG_PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(9222);

    let result = connect_to_browser_and_page(port, None).await;
    assert!(result.is_ok(), "应该能够成功连接浏览器");
}
