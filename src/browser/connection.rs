use anyhow::{Context, Result};
use chromiumoxide::{Browser, Page};
use futures::StreamExt;
use tokio::time::sleep;
use tracing::{debug, error, info};

/// 连接到已开启远程调试的浏览器，并找到排版应用所在的页面
///
/// 优先选择 URL 包含 `target_url` 的已有页面，找不到时新建页面并导航过去
pub async fn connect_to_browser_and_page(port: u16, target_url: Option<&str>) -> Result<(Browser, Page)> {
    let browser_url = format!("http://localhost:{}", port);
    info!("正在连接到浏览器: {}", browser_url);

    let (browser, mut handler) = Browser::connect(&browser_url)
        .await
        .map_err(|e| {
            error!("连接浏览器失败: {}", e);
            e
        })
        .with_context(|| format!("无法连接到浏览器 (端口: {})", port))?;
    debug!("浏览器连接成功");

    // 在后台处理浏览器事件
    tokio::spawn(async move {
        while let Some(h) = handler.next().await {
            if h.is_err() {
                break;
            }
        }
    });

    // 等待浏览器状态同步
    sleep(tokio::time::Duration::from_millis(300)).await;

    let pages = browser.pages().await?;
    debug!("获取到 {} 个页面", pages.len());

    if let Some(url) = target_url {
        for p in pages.iter() {
            if let Ok(Some(page_url)) = p.url().await {
                debug!("检查页面: {}", page_url);
                if page_url.contains(url) {
                    info!("✓ 找到排版页面: {}", page_url);
                    return Ok((browser, p.clone()));
                }
            }
        }

        debug!("未找到匹配的页面，创建新页面并导航到: {}", url);
        let page = browser
            .new_page(url)
            .await
            .with_context(|| format!("导航到 {} 失败", url))?;
        info!("已导航到: {}", url);
        return Ok((browser, page));
    }

    match pages.into_iter().next() {
        Some(page) => Ok((browser, page)),
        None => {
            let page = browser
                .new_page("about:blank")
                .await
                .context("创建空白页面失败")?;
            Ok((browser, page))
        }
    }
}
