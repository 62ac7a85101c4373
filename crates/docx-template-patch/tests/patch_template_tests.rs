use std::fs::File;
use std::io::{Read as _, Write as _};
use std::path::{Path, PathBuf};

use pretty_assertions::assert_eq;
use rstest::*;
use sha2::{Digest, Sha256};
use tempfile::TempDir;
use zip::write::FileOptions;
use zip::{ZipArchive, ZipWriter};

use docx_template_patch::container::{DocxContainer, BODY_MEMBER};
use docx_template_patch::error::PatchError;
use docx_template_patch::patch::{patch_file, PatchSpec};

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="xml" ContentType="application/xml"/></Types>"#;

const SINGLE_ROW: &str = "<w:tr><w:tc><w:p><w:r><w:t>{no_urut_yang_diubah}</w:t></w:r></w:p></w:tc><w:tc><w:p><w:r><w:t>{dasar_perubahan_lainnya}</w:t></w:r></w:p></w:tc></w:tr>";

fn document_xml(rows: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body><w:p><w:r><w:t>Formulir Perubahan Data</w:t></w:r></w:p><w:tbl>{}</w:tbl></w:body></w:document>"#,
        rows
    )
}

fn write_docx(path: &Path, body: &str) {
    let file = File::create(path).unwrap();
    let mut writer = ZipWriter::new(file);
    let options = FileOptions::default().compression_method(zip::CompressionMethod::Stored);
    writer.start_file("[Content_Types].xml", options).unwrap();
    writer.write_all(CONTENT_TYPES.as_bytes()).unwrap();
    writer.start_file(BODY_MEMBER, options).unwrap();
    writer.write_all(body.as_bytes()).unwrap();
    writer.finish().unwrap();
}

fn read_member(path: &Path, name: &str) -> String {
    let mut archive = ZipArchive::new(File::open(path).unwrap()).unwrap();
    let mut text = String::new();
    archive.by_name(name).unwrap().read_to_string(&mut text).unwrap();
    text
}

fn sha256_of(path: &Path) -> String {
    let mut buf = Vec::new();
    File::open(path).unwrap().read_to_end(&mut buf).unwrap();
    hex::encode(Sha256::digest(&buf))
}

fn spec() -> PatchSpec {
    PatchSpec {
        loop_name: "list_ubah".to_string(),
        start_field: "no_urut_yang_diubah".to_string(),
        end_field: "dasar_perubahan_lainnya".to_string(),
    }
}

#[fixture]
fn template() -> (TempDir, PathBuf) {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("F-106.docx");
    write_docx(&path, &document_xml(SINGLE_ROW));
    (dir, path)
}

#[rstest]
fn patches_single_row_template(template: (TempDir, PathBuf)) {
    let (_dir, path) = template;
    let report = patch_file(&path, &spec(), false).unwrap();

    let body = read_member(&path, BODY_MEMBER);
    assert!(body.contains("<w:t>{#list_ubah}{no_urut_yang_diubah}</w:t>"));
    assert!(body.contains("<w:t>{dasar_perubahan_lainnya}{/list_ubah}</w:t>"));
    assert!(report.open_marker_offset < report.close_marker_offset);
    assert!(report.body_changed);

    // Round-trip safety: still a valid zip with well-formed body XML.
    roxmltree::Document::parse(&body).unwrap();
}

#[rstest]
fn patching_twice_is_byte_identical(template: (TempDir, PathBuf)) {
    let (_dir, path) = template;
    patch_file(&path, &spec(), false).unwrap();
    let first = sha256_of(&path);

    let report = patch_file(&path, &spec(), false).unwrap();
    let second = sha256_of(&path);
    assert_eq!(first, second);
    assert!(report.reverted_previous);
}

#[rstest]
fn content_outside_the_markers_is_untouched(template: (TempDir, PathBuf)) {
    let (_dir, path) = template;
    let original = read_member(&path, BODY_MEMBER);
    patch_file(&path, &spec(), false).unwrap();

    let patched = read_member(&path, BODY_MEMBER);
    let excised = patched.replace("{#list_ubah}", "").replace("{/list_ubah}", "");
    assert_eq!(excised, original);
}

#[rstest]
fn other_archive_members_survive_the_rewrite(template: (TempDir, PathBuf)) {
    let (_dir, path) = template;
    patch_file(&path, &spec(), false).unwrap();
    assert_eq!(read_member(&path, "[Content_Types].xml"), CONTENT_TYPES);
}

#[test]
fn missing_field_leaves_the_file_untouched() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("F-106.docx");
    let rows = SINGLE_ROW.replace("dasar_perubahan_lainnya", "sesuatu_lain");
    write_docx(&path, &document_xml(&rows));
    let before = sha256_of(&path);

    let err = patch_file(&path, &spec(), false).unwrap_err();
    match &err {
        PatchError::TemplateFieldNotFound { name } => assert_eq!(name, "dasar_perubahan_lainnya"),
        other => panic!("expected TemplateFieldNotFound, got {:?}", other),
    }
    assert_eq!(err.exit_code(), 1);
    assert_eq!(sha256_of(&path), before);
}

#[test]
fn malformed_prior_patch_is_reverted_then_repatched() {
    let dir = TempDir::new().unwrap();
    let clean = dir.path().join("clean.docx");
    write_docx(&clean, &document_xml(SINGLE_ROW));
    patch_file(&clean, &spec(), false).unwrap();
    let expected = read_member(&clean, BODY_MEMBER);

    // The historical bad patch fused the open marker into the placeholder
    // tag: {{#list_ubah}no_urut_yang_diubah}.
    let bad_body = document_xml(SINGLE_ROW)
        .replace("{no_urut_yang_diubah}", "{{#list_ubah}no_urut_yang_diubah}");
    let broken = dir.path().join("broken.docx");
    write_docx(&broken, &bad_body);
    patch_file(&broken, &spec(), false).unwrap();

    assert_eq!(read_member(&broken, BODY_MEMBER), expected);
}

#[test]
fn already_patched_body_converges_to_itself() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("F-106.docx");
    let prepatched = document_xml(SINGLE_ROW)
        .replace("{no_urut_yang_diubah}", "{#list_ubah}{no_urut_yang_diubah}")
        .replace("{dasar_perubahan_lainnya}", "{dasar_perubahan_lainnya}{/list_ubah}");
    write_docx(&path, &prepatched);

    let report = patch_file(&path, &spec(), false).unwrap();
    assert!(!report.body_changed);
    assert_eq!(read_member(&path, BODY_MEMBER), prepatched);
}

#[test]
fn fragmented_placeholders_are_matched_across_runs() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("F-106.docx");
    let rows = SINGLE_ROW.replace(
        "{no_urut_yang_diubah}",
        "{no</w:t></w:r><w:r><w:t>_urut</w:t></w:r><w:r><w:t>_yang_diubah}",
    );
    write_docx(&path, &document_xml(&rows));

    patch_file(&path, &spec(), false).unwrap();
    let body = read_member(&path, BODY_MEMBER);
    assert!(body.contains("<w:t>{#list_ubah}{no</w:t>"));
}

#[test]
fn end_row_before_start_row_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("F-106.docx");
    let rows = "<w:tr><w:tc><w:p><w:r><w:t>{dasar_perubahan_lainnya}</w:t></w:r></w:p></w:tc></w:tr><w:tr><w:tc><w:p><w:r><w:t>{no_urut_yang_diubah}</w:t></w:r></w:p></w:tc></w:tr>";
    write_docx(&path, &document_xml(rows));
    let before = sha256_of(&path);

    let err = patch_file(&path, &spec(), false).unwrap_err();
    assert!(matches!(err, PatchError::StructuralMismatch { .. }));
    assert_eq!(err.exit_code(), 2);
    assert_eq!(sha256_of(&path), before);
}

#[test]
fn not_a_zip_is_a_container_read_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("not-a-docx.docx");
    std::fs::write(&path, b"plain text, not an archive").unwrap();

    let err = patch_file(&path, &spec(), false).unwrap_err();
    assert!(matches!(err, PatchError::ContainerRead(_)));
    assert_eq!(err.exit_code(), 3);
}

#[test]
fn zip_without_body_member_is_a_container_read_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("empty.docx");
    let file = File::create(&path).unwrap();
    let mut writer = ZipWriter::new(file);
    let options = FileOptions::default().compression_method(zip::CompressionMethod::Stored);
    writer.start_file("[Content_Types].xml", options).unwrap();
    writer.write_all(CONTENT_TYPES.as_bytes()).unwrap();
    writer.finish().unwrap();

    let err = DocxContainer::open(&path).unwrap_err();
    assert!(matches!(err, PatchError::ContainerRead(_)));
}

#[rstest]
fn dry_run_validates_but_writes_nothing(template: (TempDir, PathBuf)) {
    let (_dir, path) = template;
    let before = sha256_of(&path);

    let report = patch_file(&path, &spec(), true).unwrap();
    assert!(report.body_changed);
    assert_eq!(sha256_of(&path), before);
}
