// 该文件是 Zitai （姿态） 项目的一部分。
// src/overlay.rs - 叠加渲染
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

use ab_glyph::{FontArc, PxScale};
use image::{Rgb, RgbImage, imageops};
use imageproc::drawing::{
  draw_filled_circle_mut, draw_hollow_circle_mut, draw_line_segment_mut, draw_text_mut,
};
use thiserror::Error;

use crate::pose::{DetectionFrame, KEYPOINT_CONFIDENCE_BAR, Pose, SKELETON_EDGES};

// 绘制常量
const KEYPOINT_RADIUS: i32 = 6;
const KEYPOINT_COLOR: Rgb<u8> = Rgb([0, 255, 255]); // 青色圆点
const KEYPOINT_OUTLINE_COLOR: Rgb<u8> = Rgb([0, 0, 0]);
const SKELETON_COLOR: Rgb<u8> = Rgb([0, 255, 0]); // 绿色连线
const TEXT_COLOR: Rgb<u8> = Rgb([255, 255, 255]);
const STATUS_DETECTED_COLOR: Rgb<u8> = Rgb([0, 255, 0]);

// 文本渲染常量
const LABEL_FONT_SIZE: f32 = 12.0;
const SCORE_FONT_SIZE: f32 = 10.0;
const STATUS_FONT_SIZE: f32 = 16.0;
const LABEL_CHAR_WIDTH: f32 = 6.0; // 每字符平均宽度（粗略估计）
const STATUS_CHAR_WIDTH: f32 = 8.0;
const STATUS_TEXT_Y: i32 = 10;

const WAITING_TEXT: &str = "Waiting for person...";
const DETECTED_TEXT: &str = "Person Detected: Live Tracking";

#[derive(Error, Debug)]
pub enum OverlayError {
  #[error("无法加载字体: {0}")]
  InvalidFont(#[from] ab_glyph::InvalidFont),
}

/// 文本绘制接口：渲染逻辑与具体字体实现解耦
pub trait TextPainter {
  fn draw_text(&self, image: &mut RgbImage, color: Rgb<u8>, x: i32, y: i32, px: f32, text: &str);
}

/// 基于 ab_glyph 字体的文本绘制
pub struct FontTextPainter {
  font: FontArc,
}

impl FontTextPainter {
  pub fn from_font_bytes(data: Vec<u8>) -> Result<Self, OverlayError> {
    let font = FontArc::try_from_vec(data)?;
    Ok(Self { font })
  }
}

impl TextPainter for FontTextPainter {
  fn draw_text(&self, image: &mut RgbImage, color: Rgb<u8>, x: i32, y: i32, px: f32, text: &str) {
    draw_text_mut(image, color, x, y, PxScale::from(px), &self.font, text);
  }
}

/// 叠加渲染器：每个周期整面重绘输出表面
///
/// 同样的输入重复调用，表面内容完全一致（幂等）。
pub struct OverlayRenderer<P> {
  painter: P,
  confidence_bar: f32,
  keypoint_radius: i32,
}

impl<P: TextPainter> OverlayRenderer<P> {
  pub fn new(painter: P) -> Self {
    Self {
      painter,
      confidence_bar: KEYPOINT_CONFIDENCE_BAR,
      keypoint_radius: KEYPOINT_RADIUS,
    }
  }

  /// 按帧源原生尺寸重建输出表面；尺寸未变时保持原样。
  /// 只在帧源尺寸事件到来时调用，不逐周期调用。
  pub fn resize_surface(surface: &mut RgbImage, width: u32, height: u32) {
    if surface.dimensions() != (width, height) {
      *surface = RgbImage::new(width, height);
    }
  }

  /// 清空并重绘表面：源帧铺底，有人在场时叠加骨架标注，
  /// 否则只绘制居中的等待提示
  pub fn render(
    &self,
    surface: &mut RgbImage,
    source: &RgbImage,
    frame: &DetectionFrame,
    person_present: bool,
  ) {
    self.blit_source(surface, source);

    if person_present {
      for pose in &frame.poses {
        self.draw_pose(surface, pose);
      }
      self.painter.draw_text(
        surface,
        STATUS_DETECTED_COLOR,
        10,
        STATUS_TEXT_Y,
        STATUS_FONT_SIZE,
        DETECTED_TEXT,
      );
    } else {
      let text_width = (WAITING_TEXT.len() as f32 * STATUS_CHAR_WIDTH) as i32;
      let x = ((surface.width() as i32 - text_width) / 2).max(0);
      self.painter.draw_text(
        surface,
        TEXT_COLOR,
        x,
        STATUS_TEXT_Y,
        STATUS_FONT_SIZE,
        WAITING_TEXT,
      );
    }
  }

  // 整面重绘：源帧缩放铺满输出表面
  fn blit_source(&self, surface: &mut RgbImage, source: &RgbImage) {
    if surface.dimensions() == source.dimensions() {
      *surface = source.clone();
    } else {
      *surface = imageops::resize(
        source,
        surface.width(),
        surface.height(),
        imageops::FilterType::Triangle,
      );
    }
  }

  // 先画连线再画圆点，连线不会盖住关键点
  fn draw_pose(&self, surface: &mut RgbImage, pose: &Pose) {
    for (a, b) in SKELETON_EDGES {
      let (Some(from), Some(to)) = (pose.keypoint(a), pose.keypoint(b)) else {
        continue;
      };
      if !from.is_confident(self.confidence_bar) || !to.is_confident(self.confidence_bar) {
        continue;
      }
      draw_line_segment_mut(surface, (from.x, from.y), (to.x, to.y), SKELETON_COLOR);
    }

    for kp in &pose.keypoints {
      if !kp.is_confident(self.confidence_bar) {
        continue;
      }

      let center = (kp.x as i32, kp.y as i32);
      draw_filled_circle_mut(surface, center, self.keypoint_radius, KEYPOINT_COLOR);
      draw_hollow_circle_mut(surface, center, self.keypoint_radius, KEYPOINT_OUTLINE_COLOR);

      // 名称居中标在圆点上方，置信度百分比标在下方
      let label = kp.name.as_str();
      let label_x = kp.x as i32 - (label.len() as f32 * LABEL_CHAR_WIDTH / 2.0) as i32;
      self.painter.draw_text(
        surface,
        TEXT_COLOR,
        label_x,
        kp.y as i32 - 22,
        LABEL_FONT_SIZE,
        label,
      );

      let score = format!("{}%", (kp.confidence * 100.0).round() as i32);
      let score_x = kp.x as i32 - (score.len() as f32 * LABEL_CHAR_WIDTH / 2.0) as i32;
      self.painter.draw_text(
        surface,
        TEXT_COLOR,
        score_x,
        kp.y as i32 + 14,
        SCORE_FONT_SIZE,
        &score,
      );
    }
  }
}

impl OverlayRenderer<FontTextPainter> {
  pub fn from_font_bytes(data: Vec<u8>) -> Result<Self, OverlayError> {
    Ok(Self::new(FontTextPainter::from_font_bytes(data)?))
  }
}
