// 该文件是 Zitai （姿态） 项目的一部分。
// src/output.rs - 标注帧目录记录
//
// 本文件根据 Apache 许可证第 2.0 版（以下简称“许可证”）授权使用；
// 除非遵守该许可证条款，否则您不得使用本文件。
// 您可通过以下网址获取许可证副本：
// http://www.apache.org/licenses/LICENSE-2.0
// 除非适用法律要求或书面同意，根据本许可协议分发的软件均按“原样”提供，
// 不附带任何形式的明示或暗示的保证或条件。
// 有关许可权限与限制的具体条款，请参阅本许可协议。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, Wareless Group

use std::path::{Path, PathBuf};

use chrono::Utc;
use image::RgbImage;
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum RecordError {
  #[error("图像错误: {0}")]
  Image(#[from] image::ImageError),
  #[error("I/O 错误: {0}")]
  Io(#[from] std::io::Error),
}

/// 标注帧记录：把每个渲染周期的输出表面按序落盘为 PNG
pub struct DirectoryRecorder {
  directory: PathBuf,
  counter: u64,
}

impl DirectoryRecorder {
  /// 在 base 下建立以启动时间命名的会话子目录
  pub fn new(base: impl AsRef<Path>) -> Result<Self, RecordError> {
    let stamp = Utc::now().format("%Y%m%d-%H%M%S");
    let directory = base.as_ref().join(format!("session-{}", stamp));
    std::fs::create_dir_all(&directory)?;
    info!("标注帧记录目录: {}", directory.display());

    Ok(Self {
      directory,
      counter: 0,
    })
  }

  pub fn directory(&self) -> &Path {
    &self.directory
  }

  pub fn recorded(&self) -> u64 {
    self.counter
  }

  /// 保存一帧标注画面
  pub fn record(&mut self, surface: &RgbImage) -> Result<(), RecordError> {
    self.counter += 1;
    let path = self.directory.join(format!("frame_{:06}.png", self.counter));
    surface.save(&path)?;
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use image::Rgb;

  #[test]
  fn records_numbered_frames() {
    let base = std::env::temp_dir().join(format!("zitai-record-{}", std::process::id()));
    let _ = std::fs::remove_dir_all(&base);

    let mut recorder = DirectoryRecorder::new(&base).unwrap();
    let surface = RgbImage::from_pixel(8, 6, Rgb([1, 2, 3]));
    recorder.record(&surface).unwrap();
    recorder.record(&surface).unwrap();

    assert_eq!(recorder.recorded(), 2);
    assert!(recorder.directory().join("frame_000001.png").is_file());
    assert!(recorder.directory().join("frame_000002.png").is_file());
    let _ = std::fs::remove_dir_all(&base);
  }
}
