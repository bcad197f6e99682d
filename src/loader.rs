// loader.rs - decode panoramas off the event loop thread

use image::io::Reader as ImageReader;
use image::GenericImageView;
use pano_view::{PanoError, Result};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use std::thread;

pub struct LoadedImage {
    pub path: PathBuf,
    pub image: image::RgbaImage,
}

pub type LoadResult = Result<LoadedImage>;

pub fn decode(path: &Path) -> Result<image::RgbaImage> {
    let file = File::open(path).map_err(|e| PanoError::io(path, e))?;
    let reader = BufReader::new(file);

    let mut img = ImageReader::new(reader)
        .with_guessed_format()
        .map_err(|e| PanoError::io(path, e))?;
    // panoramas easily exceed the decoder's default size limits
    img.no_limits();
    let img = img.decode().map_err(|e| PanoError::Image {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let (w, h) = img.dimensions();
    log::info!("Decoded {:?} ({}x{})", path, w, h);
    Ok(img.to_rgba8())
}

/// Decode `path` on a worker thread and send the outcome to `tx`.
pub fn start_load_image(path: PathBuf, tx: Sender<LoadResult>) {
    thread::spawn(move || {
        log::info!("Loading {:?} in the background", path);
        let result = decode(&path).map(|image| LoadedImage { path, image });
        if tx.send(result).is_err() {
            log::warn!("Event loop is gone, dropping decoded image");
        }
    });
}
