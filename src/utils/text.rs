use once_cell::sync::Lazy;
use regex::Regex;

static PAGE_ID_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^page(\d+)$").expect("valid regex"));

/// 地址后缀里认可的图片扩展名，其余后缀（php、aspx 等）交给 Content-Type 判断
const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp"];

/// 没有协议头的地址补上 `https://`
pub fn normalize_url(url: &str) -> String {
    let url = url.trim();
    if url.starts_with("http://") || url.starts_with("https://") {
        url.to_string()
    } else {
        format!("https://{}", url)
    }
}

/// 从 `page12` 这样的元素 id 中取出页码
pub fn parse_page_index(id: &str) -> Option<u32> {
    PAGE_ID_RE
        .captures(id)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// 按地址路径最后一段的后缀推断图片扩展名，查询串和锚点不计入
pub fn extension_from_url(url: &str) -> Option<String> {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let path = path
        .split_once("://")
        .map(|(_, rest)| rest.split_once('/').map(|(_, p)| p).unwrap_or(""))
        .unwrap_or(path);
    let last = path.rsplit('/').next().unwrap_or("");
    let (_, ext) = last.rsplit_once('.')?;
    let ext = ext.to_ascii_lowercase();
    match ext.as_str() {
        "jpeg" => Some("jpg".to_string()),
        e if IMAGE_EXTENSIONS.contains(&e) => Some(ext),
        _ => None,
    }
}

/// 按 Content-Type 推断扩展名
pub fn extension_from_content_type(content_type: &str) -> Option<&'static str> {
    let content_type = content_type.to_ascii_lowercase();
    if content_type.contains("png") {
        Some("png")
    } else if content_type.contains("gif") {
        Some("gif")
    } else if content_type.contains("webp") {
        Some("webp")
    } else if content_type.contains("jpeg") || content_type.contains("jpg") {
        Some("jpg")
    } else {
        None
    }
}
