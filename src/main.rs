// 该文件是 Zitai （姿态） 项目的一部分。
// src/main.rs - 姿态叠加回放演示
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

mod args;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use zitai::input::ImageDirectorySource;
use zitai::model::ReplayEstimator;
use zitai::output::DirectoryRecorder;
use zitai::overlay::OverlayRenderer;
use zitai::state::StateStore;
use zitai::task::TrackingTask;
use zitai::track::Tracker;

fn main() -> Result<()> {
  tracing_subscriber::fmt::init();

  let args = args::Args::parse();

  info!("帧目录: {}", args.frames.display());
  info!("姿态记录: {}", args.poses.display());
  info!("输出目录: {}", args.output.display());

  let source = ImageDirectorySource::new(&args.frames)?;
  info!("帧源已就绪: {} 帧", source.frame_count());

  let font_data = std::fs::read(&args.font)
    .with_context(|| format!("无法读取字体文件: {}", args.font.display()))?;
  let renderer = OverlayRenderer::from_font_bytes(font_data)?;

  let estimator = ReplayEstimator::from_path(&args.poses);
  let store = Arc::new(StateStore::new());
  let mut tracker = Tracker::new(source, estimator, renderer, store);

  info!("正在启动跟踪会话...");
  tracker.start()?;

  let mut recorder = DirectoryRecorder::new(&args.output)?;
  let max_cycles = (args.max_cycles > 0).then_some(args.max_cycles);
  let task = TrackingTask::new(args.fps).with_max_cycles(max_cycles);

  let mut last_present = false;
  task.run(&mut tracker, |surface, state| {
    if state.person_present != last_present {
      last_present = state.person_present;
      if state.person_present {
        info!("检测到人体，开始实时跟踪 ({} 个姿态)", state.detection_count());
      } else {
        info!("目标离开画面，等待重新检测");
      }
    }
    recorder.record(surface)?;
    Ok(())
  })?;

  info!("标注帧已写入: {} ({} 帧)", recorder.directory().display(), recorder.recorded());
  Ok(())
}
