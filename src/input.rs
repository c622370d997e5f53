// 该文件是 Zitai （姿态） 项目的一部分。
// src/input.rs - 帧源
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

use anyhow::{Context, Result};
use image::{ImageReader, RgbImage};
use tracing::warn;

/// 帧源：像素内容异步更新，核心不拥有采集层
pub trait FrameSource {
  /// 原生尺寸；就绪事件触发前为 None
  fn native_size(&self) -> Option<(u32, u32)>;

  /// 取走一次尺寸事件（就绪或尺寸变更）；无事件时为 None
  fn poll_resize(&mut self) -> Option<(u32, u32)>;

  /// 是否已有可读帧；探测不消耗帧
  fn is_ready(&mut self) -> bool;

  /// 当前可解码帧；尚无帧时为 None，对应一次空转周期
  fn current_frame(&mut self) -> Option<&RgbImage>;
}

/// 图片目录帧源：按文件名顺序回放一个目录中的帧，
/// 播完后停留在最后一帧上（模拟持续出帧的摄像头画面）
pub struct ImageDirectorySource {
  paths: Vec<PathBuf>,
  cursor: usize,
  current: Option<RgbImage>,
  // 当前帧尚未被读取过；就绪探测加载的帧留给第一次读取
  fresh: bool,
  native_size: Option<(u32, u32)>,
  size_event: Option<(u32, u32)>,
}

impl ImageDirectorySource {
  /// 扫描目录中的图片文件并创建帧源
  pub fn new(dir: impl AsRef<Path>) -> Result<Self> {
    let dir = dir.as_ref();
    let mut paths = Vec::new();
    for entry in
      std::fs::read_dir(dir).with_context(|| format!("无法读取帧目录: {}", dir.display()))?
    {
      let path = entry?.path();
      let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase());
      if matches!(ext.as_deref(), Some("jpg" | "jpeg" | "png" | "bmp")) {
        paths.push(path);
      }
    }
    paths.sort();

    Ok(Self {
      paths,
      cursor: 0,
      current: None,
      fresh: false,
      native_size: None,
      size_event: None,
    })
  }

  /// 目录中的帧文件数量
  pub fn frame_count(&self) -> usize {
    self.paths.len()
  }

  fn advance(&mut self) {
    while self.cursor < self.paths.len() {
      let path = self.paths[self.cursor].clone();
      self.cursor += 1;

      let decoded = ImageReader::open(&path).ok().and_then(|r| r.decode().ok());
      let Some(image) = decoded else {
        // 解码失败的文件跳过，不中断回放
        warn!("跳过无法解码的帧文件: {}", path.display());
        continue;
      };

      let image = image.to_rgb8();
      let size = (image.width(), image.height());
      if self.native_size != Some(size) {
        self.native_size = Some(size);
        self.size_event = Some(size);
      }
      self.current = Some(image);
      self.fresh = true;
      return;
    }
  }
}

impl FrameSource for ImageDirectorySource {
  fn native_size(&self) -> Option<(u32, u32)> {
    self.native_size
  }

  fn poll_resize(&mut self) -> Option<(u32, u32)> {
    self.size_event.take()
  }

  fn is_ready(&mut self) -> bool {
    if self.current.is_none() && self.cursor < self.paths.len() {
      self.advance();
    }
    self.current.is_some()
  }

  fn current_frame(&mut self) -> Option<&RgbImage> {
    if !self.fresh && self.cursor < self.paths.len() {
      self.advance();
    }
    self.fresh = false;
    self.current.as_ref()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use image::Rgb;

  fn temp_frame_dir(tag: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("zitai-input-{}-{}", tag, std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
  }

  fn save_frame(dir: &Path, name: &str, w: u32, h: u32) {
    let image = RgbImage::from_pixel(w, h, Rgb([10, 20, 30]));
    image.save(dir.join(name)).unwrap();
  }

  #[test]
  fn empty_directory_has_no_frame() {
    let dir = temp_frame_dir("empty");
    let mut source = ImageDirectorySource::new(&dir).unwrap();
    assert_eq!(source.frame_count(), 0);
    assert!(!source.is_ready());
    assert!(source.current_frame().is_none());
    assert!(source.native_size().is_none());
    assert!(source.poll_resize().is_none());
    let _ = std::fs::remove_dir_all(&dir);
  }

  #[test]
  fn replays_frames_and_holds_last_one() {
    let dir = temp_frame_dir("replay");
    save_frame(&dir, "frame_0001.png", 8, 6);
    save_frame(&dir, "frame_0002.png", 8, 6);
    let mut source = ImageDirectorySource::new(&dir).unwrap();

    assert!(source.current_frame().is_some());
    assert!(source.current_frame().is_some());
    // 播完后停留在最后一帧
    assert!(source.current_frame().is_some());
    assert_eq!(source.native_size(), Some((8, 6)));
    let _ = std::fs::remove_dir_all(&dir);
  }

  #[test]
  fn readiness_probe_does_not_consume_a_frame() {
    let dir = temp_frame_dir("probe");
    save_frame(&dir, "a.png", 8, 6);
    save_frame(&dir, "b.png", 16, 12);
    let mut source = ImageDirectorySource::new(&dir).unwrap();

    assert!(source.is_ready());
    assert!(source.is_ready());
    assert_eq!(source.poll_resize(), Some((8, 6)));

    // 探测加载的第一帧留给第一次读取，不会被跳过
    assert_eq!(source.current_frame().unwrap().dimensions(), (8, 6));
    assert_eq!(source.current_frame().unwrap().dimensions(), (16, 12));
    let _ = std::fs::remove_dir_all(&dir);
  }

  #[test]
  fn size_event_fires_on_readiness_and_on_change() {
    let dir = temp_frame_dir("resize");
    save_frame(&dir, "a.png", 8, 6);
    save_frame(&dir, "b.png", 16, 12);
    let mut source = ImageDirectorySource::new(&dir).unwrap();

    assert!(source.poll_resize().is_none());
    source.current_frame().unwrap();
    assert_eq!(source.poll_resize(), Some((8, 6)));
    assert!(source.poll_resize().is_none());

    source.current_frame().unwrap();
    assert_eq!(source.poll_resize(), Some((16, 12)));
    let _ = std::fs::remove_dir_all(&dir);
  }
}
