use std::path::{Path, PathBuf};

use image::{DynamicImage, ImageReader};
use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, ObjectId, Stream, dictionary};
use tracing::{debug, info, warn};

use crate::core::{CaptureError, DownloadResult};
use crate::services::download::saved_paths;

/// 生成好的 PDF
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssembledPdf {
    pub path: PathBuf,
    /// 按写入顺序排列的页码
    pub pages: Vec<u32>,
    /// 解码失败被跳过的页码
    pub skipped: Vec<u32>,
}

/// 把下载成功的图片按页码升序拼成 PDF，每张图一页，页面尺寸等于图片像素尺寸
///
/// 解码失败的图片跳过；一张都没有时返回 [`CaptureError::EmptyResult`]，不写空 PDF。
pub fn assemble_pdf(results: &[DownloadResult], pdf_path: &Path) -> Result<AssembledPdf, CaptureError> {
    let mut entries = saved_paths(results);
    entries.sort_by_key(|(index, _)| *index);

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let mut kids: Vec<Object> = Vec::with_capacity(entries.len());
    let mut pages = Vec::with_capacity(entries.len());
    let mut skipped = Vec::new();

    for (index, path) in entries {
        let img = match decode_image(index, &path) {
            Ok(img) => img,
            Err(e) => {
                warn!("跳过 {}: {}", path.display(), e);
                skipped.push(index);
                continue;
            }
        };
        let page_id = add_image_page(&mut doc, pages_id, index, &img).map_err(|reason| CaptureError::Pdf {
            path: pdf_path.to_path_buf(),
            reason,
        })?;
        debug!("已添加 page{} 到 PDF", index);
        kids.push(page_id.into());
        pages.push(index);
    }

    if pages.is_empty() {
        return Err(CaptureError::EmptyResult);
    }

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => pages.len() as i64,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.compress();

    if let Some(parent) = pdf_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    doc.save(pdf_path).map_err(|e| CaptureError::Pdf {
        path: pdf_path.to_path_buf(),
        reason: e.to_string(),
    })?;

    info!("PDF 已保存: {} (共 {} 页)", pdf_path.display(), pages.len());
    Ok(AssembledPdf {
        path: pdf_path.to_path_buf(),
        pages,
        skipped,
    })
}

/// 按文件内容识别格式，不相信扩展名
fn decode_image(index: u32, path: &Path) -> Result<DynamicImage, CaptureError> {
    let decode_error = |reason: String| CaptureError::Decode { index, reason };
    ImageReader::open(path)?
        .with_guessed_format()?
        .decode()
        .map_err(|e| decode_error(e.to_string()))
}

fn add_image_page(doc: &mut Document, pages_id: ObjectId, index: u32, img: &DynamicImage) -> Result<ObjectId, String> {
    let rgb = img.to_rgb8();
    let (width, height) = rgb.dimensions();
    let (width, height) = (width as i64, height as i64);

    let image_id = doc.add_object(Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => width,
            "Height" => height,
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8,
        },
        rgb.into_raw(),
    ));

    let name = format!("Im{}", index);
    let content = Content {
        operations: vec![
            Operation::new("q", vec![]),
            Operation::new(
                "cm",
                vec![
                    Object::Integer(width),
                    0.into(),
                    0.into(),
                    Object::Integer(height),
                    0.into(),
                    0.into(),
                ],
            ),
            Operation::new("Do", vec![Object::Name(name.clone().into_bytes())]),
            Operation::new("Q", vec![]),
        ],
    };
    let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().map_err(|e| e.to_string())?));

    Ok(doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "MediaBox" => vec![0.into(), 0.into(), Object::Integer(width), Object::Integer(height)],
        "Contents" => content_id,
        "Resources" => dictionary! {
            "XObject" => dictionary! {
                name => image_id,
            },
        },
    }))
}
