use std::collections::BTreeMap;

use tracing::debug;

use crate::core::{DiscoveredResource, RawImage};
use crate::utils::text::parse_page_index;

/// 从一次扫描得到的 `<img>` 中挑出 `pageN` 图片
///
/// id 必须完整匹配 `page\d+`，`src` 不能为空；`viewport_only` 时只接受当前视口内的图片，
/// 视口外的懒加载占位图会在滚到它时再被扫到。
pub fn locate(raw: &[RawImage], viewport_only: bool) -> Vec<DiscoveredResource> {
    raw.iter()
        .filter(|img| !viewport_only || img.visible)
        .filter_map(|img| {
            let url = img.src.trim();
            if url.is_empty() {
                return None;
            }
            let index = parse_page_index(img.id.trim())?;
            Some(DiscoveredResource {
                index,
                url: url.to_string(),
            })
        })
        .collect()
}

/// 一次合并带来的变化
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MergeDelta {
    pub added: usize,
    pub changed: usize,
}

impl MergeDelta {
    pub fn is_empty(&self) -> bool {
        self.added == 0 && self.changed == 0
    }
}

/// 按页码去重的已发现图片，同一页码后写覆盖先写
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ResourceMap {
    entries: BTreeMap<u32, String>,
}

impl ResourceMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn merge<I>(&mut self, found: I) -> MergeDelta
    where
        I: IntoIterator<Item = DiscoveredResource>,
    {
        let mut delta = MergeDelta::default();
        for resource in found {
            match self.entries.insert(resource.index, resource.url.clone()) {
                None => {
                    debug!("发现新图片 page{}", resource.index);
                    delta.added += 1;
                }
                Some(previous) if previous != resource.url => {
                    debug!("page{} 地址更新: {} -> {}", resource.index, previous, resource.url);
                    delta.changed += 1;
                }
                Some(_) => {}
            }
        }
        delta
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: u32) -> Option<&str> {
        self.entries.get(&index).map(String::as_str)
    }

    /// 按页码升序
    pub fn resources(&self) -> Vec<DiscoveredResource> {
        self.entries
            .iter()
            .map(|(index, url)| DiscoveredResource {
                index: *index,
                url: url.clone(),
            })
            .collect()
    }
}
