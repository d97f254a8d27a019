use crate::core::{CaptureError, ScrollTarget};

/// 选择滚动对象：顶层 div#contents → iframe 内 div#contents → iframe 文档 → 主页面
pub const RESOLVE_TARGET_JS: &str = r#"
        () => {
            const scrollable = (el) => !!el && el.scrollHeight > el.clientHeight;
            if (scrollable(document.getElementById('contents'))) {
                return { kind: 'contents_div' };
            }
            const frames = Array.from(document.querySelectorAll('iframe'));
            for (let i = 0; i < frames.length; i++) {
                let doc = null;
                try {
                    doc = frames[i].contentDocument;
                } catch (e) {
                    continue;
                }
                if (!doc || !doc.body) {
                    continue;
                }
                if (scrollable(doc.getElementById('contents'))) {
                    return { kind: 'iframe_contents', frame: i };
                }
                const win = frames[i].contentWindow;
                if (win && doc.body.scrollHeight > win.innerHeight) {
                    return { kind: 'iframe', frame: i };
                }
            }
            return { kind: 'main_page' };
        }
    "#;

/// 根据 target 取出 (doc, win, el)，el 只在 div#contents 时存在
const LOCATE_TARGET_JS: &str = r#"
            const locate = (target) => {
                let doc = document;
                let win = window;
                if (target.kind === 'iframe' || target.kind === 'iframe_contents') {
                    const frame = document.querySelectorAll('iframe')[target.frame];
                    if (!frame || !frame.contentDocument) {
                        throw new Error('iframe ' + target.frame + ' 不可用');
                    }
                    doc = frame.contentDocument;
                    win = frame.contentWindow;
                }
                let el = null;
                if (target.kind === 'contents_div' || target.kind === 'iframe_contents') {
                    el = doc.getElementById('contents');
                    if (!el) {
                        throw new Error('div#contents 已不存在');
                    }
                }
                return { doc, win, el };
            };
    "#;

const SCROLL_STEP_BODY_JS: &str = r#"
            const { doc, win, el } = locate(target);
            if (el) {
                el.scrollTop += el.clientHeight;
                return {
                    position: el.scrollTop,
                    max: Math.max(el.scrollHeight - el.clientHeight, 0)
                };
            }
            win.scrollBy(0, win.innerHeight);
            const body = doc.body || doc.documentElement;
            return {
                position: win.pageYOffset,
                max: Math.max(body.scrollHeight - win.innerHeight, 0)
            };
    "#;

const SCAN_IMAGES_BODY_JS: &str = r#"
            const { doc, win, el } = locate(target);
            const root = el || doc;
            const viewHeight = win.innerHeight || doc.documentElement.clientHeight;
            return Array.from(root.querySelectorAll("img[id^='page']")).map(img => {
                const rect = img.getBoundingClientRect();
                const displayed = img.offsetParent !== null && rect.height > 0;
                return {
                    id: img.id || '',
                    src: img.currentSrc || img.src || '',
                    visible: displayed && rect.top <= viewHeight && rect.bottom >= 0
                };
            });
    "#;

fn call_with_target(body: &str, target: &ScrollTarget) -> Result<String, CaptureError> {
    let target_json = serde_json::to_string(target).map_err(CaptureError::script)?;
    Ok(format!(
        "((target) => {{ {} {} }})({})",
        LOCATE_TARGET_JS, body, target_json
    ))
}

/// 向下滚动一个视口高度，返回滚动后的位置
pub fn scroll_step_js(target: &ScrollTarget) -> Result<String, CaptureError> {
    call_with_target(SCROLL_STEP_BODY_JS, target)
}

/// 列出滚动对象中所有 `img[id^='page']`
pub fn scan_images_js(target: &ScrollTarget) -> Result<String, CaptureError> {
    call_with_target(SCAN_IMAGES_BODY_JS, target)
}

pub const HIDE_WEBDRIVER_JS: &str =
    "Object.defineProperty(navigator, 'webdriver', { get: () => undefined })";
