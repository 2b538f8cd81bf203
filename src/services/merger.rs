//! PDF 合并服务
//!
//! 读取暂存目录中的所有 PDF，按文件名中的学号排序后依次拼接页面，
//! 写出一个合并文件。无法解析或没有页面的文件会被跳过并记录。

use std::path::{Path, PathBuf};

use lopdf::{Document, Object, ObjectId};
use tracing::{debug, info, warn};

use crate::error::MergeError;
use crate::models::split_roll;

/// 文档扩展名
pub const DOCUMENT_EXTENSION: &str = "pdf";

/// 合并结果
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MergeReport {
    /// 成功合并的文件（按合并顺序）
    pub merged: Vec<PathBuf>,
    /// 被跳过的文件（损坏或没有页面）
    pub skipped: Vec<PathBuf>,
    /// 输出文档总页数
    pub total_pages: usize,
    /// 是否写出了输出文件
    pub written: bool,
}

impl MergeReport {
    /// 被跳过文件对应的学号（文件名去掉扩展名）
    pub fn skipped_rolls(&self) -> Vec<String> {
        self.skipped
            .iter()
            .filter_map(|p| p.file_stem())
            .map(|s| s.to_string_lossy().to_string())
            .collect()
    }
}

/// PDF 合并器
pub struct PdfMerger;

impl PdfMerger {
    /// 合并 `staging_dir` 中的所有 PDF 到 `output_path`
    ///
    /// 没有可合并的文件时不会创建输出文件
    pub fn merge_dir(staging_dir: &Path, output_path: &Path) -> Result<MergeReport, MergeError> {
        let inputs = list_documents(staging_dir)?;
        if inputs.is_empty() {
            info!("暂存目录中没有 PDF，跳过合并");
            return Ok(MergeReport::default());
        }
        Self::merge_files(&inputs, output_path)
    }

    /// 按给定顺序合并文件
    pub fn merge_files(inputs: &[PathBuf], output_path: &Path) -> Result<MergeReport, MergeError> {
        let mut report = MergeReport::default();
        let mut merged: Option<Document> = None;

        for (idx, path) in inputs.iter().enumerate() {
            debug!("[{}/{}] 读取: {}", idx + 1, inputs.len(), path.display());

            let mut doc = match load_document(path) {
                Ok(doc) => doc,
                Err(reason) => {
                    warn!("⚠️ 跳过无法合并的文件 {}: {}", path.display(), reason);
                    report.skipped.push(path.clone());
                    continue;
                }
            };

            let page_count = doc.get_pages().len();
            match merged.as_mut() {
                None => merged = Some(doc),
                Some(base) => {
                    // 重新编号避免对象 ID 冲突
                    doc.renumber_objects_with(base.max_id + 1);
                    base.max_id = doc.max_id;

                    let page_ids: Vec<ObjectId> = doc.get_pages().into_values().collect();
                    base.objects.extend(doc.objects);
                    append_pages_to_page_tree(base, page_ids)?;
                }
            }

            debug!("    → 添加 {} 页", page_count);
            report.total_pages += page_count;
            report.merged.push(path.clone());
        }

        let Some(mut merged) = merged else {
            warn!("⚠️ 所有 PDF 均无法读取，未生成合并文件");
            return Ok(report);
        };

        merged.renumber_objects();
        merged.compress();
        write_document(&mut merged, output_path)?;
        report.written = true;

        info!(
            "✅ 合并完成: {} 个文件, {} 页 -> {}",
            report.merged.len(),
            report.total_pages,
            output_path.display()
        );
        Ok(report)
    }
}

/// 列出目录中的 PDF，并按文件名中的学号排序
pub fn list_documents(dir: &Path) -> Result<Vec<PathBuf>, MergeError> {
    let list_failed = |source| MergeError::ListFailed {
        path: dir.display().to_string(),
        source,
    };

    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(list_failed)? {
        let path = entry.map_err(list_failed)?.path();
        let is_pdf = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case(DOCUMENT_EXTENSION));
        if is_pdf && path.is_file() {
            files.push(path);
        }
    }

    files.sort_by(|a, b| sort_key(a).cmp(&sort_key(b)));
    Ok(files)
}

/// 学号格式的文件按 (前缀, 数字) 排序，其余文件排在后面按文件名排序
fn sort_key(path: &Path) -> (u8, String, u32, String) {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    match split_roll(&stem) {
        Some((prefix, number)) => (0, prefix.to_string(), number, stem.clone()),
        None => (1, String::new(), 0, stem),
    }
}

fn load_document(path: &Path) -> Result<Document, String> {
    let doc = Document::load(path).map_err(|e| e.to_string())?;
    if doc.get_pages().is_empty() {
        return Err("文档没有页面".to_string());
    }
    Ok(doc)
}

/// 把页面引用追加到合并文档的根 Pages 字典
fn append_pages_to_page_tree(merged: &mut Document, page_ids: Vec<ObjectId>) -> Result<(), MergeError> {
    let page_count = page_ids.len() as i64;
    let pages_id = merged.catalog()?.get(b"Pages")?.as_reference()?;
    let pages_dict = merged.get_object_mut(pages_id)?.as_dict_mut()?;

    let kids = pages_dict.get_mut(b"Kids")?.as_array_mut()?;
    kids.extend(page_ids.into_iter().map(Object::Reference));

    let current_count = pages_dict.get(b"Count")?.as_i64()?;
    pages_dict.set("Count", Object::Integer(current_count + page_count));

    Ok(())
}

/// 先写临时文件再重命名，失败时不会留下不完整的合并文件
fn write_document(doc: &mut Document, output_path: &Path) -> Result<(), MergeError> {
    let write_failed = |reason: String| MergeError::WriteFailed {
        path: output_path.display().to_string(),
        reason,
    };

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).map_err(|e| write_failed(e.to_string()))?;

    let tmp_path = output_path.with_extension("pdf.tmp");
    std::fs::write(&tmp_path, &buffer).map_err(|e| write_failed(e.to_string()))?;
    std::fs::rename(&tmp_path, output_path).map_err(|e| {
        let _ = std::fs::remove_file(&tmp_path);
        write_failed(e.to_string())
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use lopdf::{dictionary, Stream};
    use rstest::rstest;
    use tempfile::tempdir;

    /// 生成测试 PDF，每页字典带有 `Label` 标记（"<label>-<页序号>"）
    pub(crate) fn create_test_pdf(path: &Path, label: &str, pages: u32) {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let resources_id = doc.add_object(dictionary! {});

        let mut kids = Vec::new();
        for n in 0..pages {
            let content_id = doc.add_object(Stream::new(dictionary! {}, Vec::new()));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
                "Resources" => resources_id,
                "Contents" => content_id,
                "Label" => Object::string_literal(format!("{}-{}", label, n)),
            });
            kids.push(Object::Reference(page_id));
        }

        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => pages as i64,
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        doc.save(path).unwrap();
    }

    /// 按页顺序取出每页的 `Label` 标记
    pub(crate) fn page_labels(path: &Path) -> Vec<String> {
        let doc = Document::load(path).unwrap();
        doc.get_pages()
            .into_values()
            .map(|id| {
                let label = doc.get_dictionary(id).unwrap().get(b"Label").unwrap();
                String::from_utf8_lossy(label.as_str().unwrap()).to_string()
            })
            .collect()
    }

    #[test]
    fn empty_directory_writes_nothing() {
        let dir = tempdir().unwrap();
        let output = dir.path().join("Final_Merged.pdf");

        let report = PdfMerger::merge_dir(dir.path(), &output).unwrap();

        assert!(!report.written);
        assert_eq!(report.total_pages, 0);
        assert!(!output.exists());
    }

    #[rstest]
    #[case(vec![1, 1])]
    #[case(vec![2, 3])]
    #[case(vec![1, 4, 2])]
    fn page_count_is_sum_of_inputs(#[case] page_counts: Vec<u32>) {
        let staging = tempdir().unwrap();
        let out_dir = tempdir().unwrap();
        for (i, pages) in page_counts.iter().enumerate() {
            let roll = format!("R{:04}", i + 1);
            create_test_pdf(&staging.path().join(format!("{}.pdf", roll)), &roll, *pages);
        }
        let output = out_dir.path().join("Final_Merged.pdf");

        let report = PdfMerger::merge_dir(staging.path(), &output).unwrap();

        let expected: u32 = page_counts.iter().sum();
        assert!(report.written);
        assert_eq!(report.total_pages, expected as usize);
        assert_eq!(Document::load(&output).unwrap().get_pages().len(), expected as usize);
    }

    #[test]
    fn pages_follow_roll_order_not_listing_order() {
        let staging = tempdir().unwrap();
        let out_dir = tempdir().unwrap();
        // 数字后缀排序与字典序一致，但 "other" 不是学号，必须排在最后
        create_test_pdf(&staging.path().join("other.pdf"), "other", 1);
        create_test_pdf(&staging.path().join("A2021B0010.pdf"), "A2021B0010", 1);
        create_test_pdf(&staging.path().join("A2021B0002.pdf"), "A2021B0002", 2);
        let output = out_dir.path().join("merged.pdf");

        PdfMerger::merge_dir(staging.path(), &output).unwrap();

        assert_eq!(
            page_labels(&output),
            vec!["A2021B0002-0", "A2021B0002-1", "A2021B0010-0", "other-0"]
        );
    }

    #[test]
    fn corrupt_input_is_skipped_and_recorded() {
        let staging = tempdir().unwrap();
        let out_dir = tempdir().unwrap();
        create_test_pdf(&staging.path().join("R0001.pdf"), "R0001", 1);
        std::fs::write(staging.path().join("R0002.pdf"), b"<html>not found</html>").unwrap();
        create_test_pdf(&staging.path().join("R0003.pdf"), "R0003", 1);
        let output = out_dir.path().join("merged.pdf");

        let report = PdfMerger::merge_dir(staging.path(), &output).unwrap();

        assert_eq!(report.skipped_rolls(), vec!["R0002"]);
        assert_eq!(report.merged.len(), 2);
        assert_eq!(page_labels(&output), vec!["R0001-0", "R0003-0"]);
    }

    #[test]
    fn all_inputs_corrupt_writes_nothing() {
        let staging = tempdir().unwrap();
        let out_dir = tempdir().unwrap();
        std::fs::write(staging.path().join("R0001.pdf"), b"garbage").unwrap();
        let output = out_dir.path().join("merged.pdf");

        let report = PdfMerger::merge_dir(staging.path(), &output).unwrap();

        assert!(!report.written);
        assert_eq!(report.skipped.len(), 1);
        assert!(!output.exists());
    }

    #[test]
    fn existing_output_is_overwritten() {
        let staging = tempdir().unwrap();
        let out_dir = tempdir().unwrap();
        let output = out_dir.path().join("merged.pdf");
        std::fs::write(&output, b"stale").unwrap();
        create_test_pdf(&staging.path().join("R0001.pdf"), "R0001", 3);

        PdfMerger::merge_dir(staging.path(), &output).unwrap();

        assert_eq!(Document::load(&output).unwrap().get_pages().len(), 3);
    }

    #[test]
    fn non_pdf_files_are_ignored() {
        let staging = tempdir().unwrap();
        std::fs::write(staging.path().join("notes.txt"), b"x").unwrap();
        std::fs::write(staging.path().join("R0001.pdf.part"), b"x").unwrap();

        assert!(list_documents(staging.path()).unwrap().is_empty());
    }

    #[test]
    fn missing_staging_directory_is_an_error() {
        let dir = tempdir().unwrap();
        let result = PdfMerger::merge_dir(&dir.path().join("nope"), &dir.path().join("out.pdf"));
        assert!(matches!(result, Err(MergeError::ListFailed { .. })));
    }
}
