//! Integration test: uploads through the handler, against a real
//! temporary storage root.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::fs;

use prism_io::{ArtifactStore, IoError, UploadHandler, UploadRequest};
use prism_pipeline::{OutputFormat, PipelineError, Raster, decode, encode};

fn color_png(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([
            u8::try_from(x * 10 % 256).unwrap(),
            u8::try_from(y * 10 % 256).unwrap(),
            128,
        ])
    });
    encode(&Raster::Rgb(img), OutputFormat::Png).unwrap()
}

fn request(file_name: &str, task: &str, kernel_size: Option<&str>) -> UploadRequest {
    UploadRequest {
        file_name: file_name.to_owned(),
        bytes: color_png(20, 10),
        task: Some(task.to_owned()),
        kernel_size: kernel_size.map(str::to_owned),
    }
}

fn handler() -> (tempfile::TempDir, UploadHandler) {
    let dir = tempfile::tempdir().unwrap();
    let store = ArtifactStore::new(dir.path().join("uploads"));
    (dir, UploadHandler::new(store))
}

fn stored_names(handler: &UploadHandler) -> Vec<String> {
    let Ok(entries) = fs::read_dir(handler.store().root()) else {
        return Vec::new();
    };
    let mut names: Vec<_> = entries
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[test]
fn grayscale_upload_writes_original_and_artifact() {
    let (_dir, handler) = handler();
    let response = handler.handle(&request("photo.png", "1", None)).unwrap();

    assert_eq!(response.original_name, "photo.png");
    assert_eq!(response.artifact_name, "processed_photo.png");
    assert!(response.histogram.is_none());
    assert_eq!(stored_names(&handler), ["photo.png", "processed_photo.png"]);

    let artifact = decode(&handler.store().open("processed_photo.png").unwrap()).unwrap();
    assert_eq!(artifact.channels(), 1);
    assert_eq!(artifact.width(), 20);
    assert_eq!(artifact.height(), 10);
}

#[test]
fn jpeg_upload_keeps_jpeg_format() {
    let (_dir, handler) = handler();
    let response = handler.handle(&request("cat.JPG", "3", Some("7"))).unwrap();
    assert_eq!(response.artifact_name, "processed_cat.JPG");
    let bytes = fs::read(&response.artifact_path).unwrap();
    // JPEG SOI marker.
    assert_eq!(&bytes[..2], &[0xFF, 0xD8]);
}

#[test]
fn disallowed_extension_writes_nothing() {
    let (_dir, handler) = handler();
    let result = handler.handle(&request("anim.gif", "1", None));
    assert!(matches!(
        result,
        Err(IoError::Pipeline(PipelineError::UnsupportedFile(_)))
    ));
    assert!(stored_names(&handler).is_empty());
}

#[test]
fn invalid_kernel_size_writes_nothing() {
    let (_dir, handler) = handler();
    for raw in ["4", "abc", "1", "257", "99999999999999999999"] {
        let result = handler.handle(&request("photo.png", "2", Some(raw)));
        assert!(
            matches!(result, Err(IoError::Pipeline(PipelineError::InvalidParameter(_)))),
            "kernel size {raw:?}"
        );
    }
    assert!(stored_names(&handler).is_empty());
}

#[test]
fn median_accepts_even_kernel_size() {
    let (_dir, handler) = handler();
    let response = handler.handle(&request("photo.png", "4", Some("4"))).unwrap();
    let artifact = decode(&fs::read(response.artifact_path).unwrap()).unwrap();
    assert_eq!(artifact.channels(), 3);
}

#[test]
fn undecodable_bytes_keep_original_but_write_no_artifact() {
    let (_dir, handler) = handler();
    let mut req = request("broken.png", "1", None);
    req.bytes = b"not an image".to_vec();
    let result = handler.handle(&req);
    assert!(matches!(
        result,
        Err(IoError::Pipeline(PipelineError::ImageDecode(_)))
    ));
    assert_eq!(stored_names(&handler), ["broken.png"]);
}

#[test]
fn unknown_task_stores_identity_copy() {
    let (_dir, handler) = handler();
    let req = request("photo.png", "42", None);
    let response = handler.handle(&req).unwrap();
    let artifact = decode(&fs::read(response.artifact_path).unwrap()).unwrap();
    assert_eq!(artifact, decode(&req.bytes).unwrap());
}

#[test]
fn rerun_overwrites_previous_artifact() {
    let (_dir, handler) = handler();
    handler.handle(&request("photo.png", "1", None)).unwrap();
    handler.handle(&request("photo.png", "5", None)).unwrap();
    assert_eq!(stored_names(&handler), ["photo.png", "processed_photo.png"]);
    let artifact = decode(&handler.store().open("processed_photo.png").unwrap()).unwrap();
    assert_eq!(artifact.channels(), 3);
}

#[test]
fn client_path_components_are_stripped() {
    let (_dir, handler) = handler();
    let response = handler
        .handle(&request("../../evil dir/my photo.png", "1", None))
        .unwrap();
    assert_eq!(response.original_name, "my_photo.png");
    assert_eq!(response.artifact_name, "processed_my_photo.png");
    assert_eq!(
        stored_names(&handler),
        ["my_photo.png", "processed_my_photo.png"]
    );
}

#[test]
fn response_serializes_to_json() {
    let (_dir, handler) = handler();
    let response = handler.handle(&request("photo.png", "2", Some("3"))).unwrap();
    let json = serde_json::to_value(&response).unwrap();
    assert_eq!(json["artifact_name"], "processed_photo.png");
    assert!(json["histogram"].is_null());
}
