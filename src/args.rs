// 该文件是 Zitai （姿态） 项目的一部分。
// src/args.rs - 演示程序参数配置
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

use std::path::PathBuf;

use clap::Parser;

/// Zitai 实时姿态叠加演示参数
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  /// 帧目录（按文件名顺序回放的图片帧）
  #[arg(long, value_name = "DIR")]
  pub frames: PathBuf,

  /// 姿态记录 JSON 文件（逐周期回放的推理结果）
  #[arg(long, value_name = "FILE")]
  pub poses: PathBuf,

  /// 标签字体文件 (TTF/OTF)
  #[arg(long, value_name = "FILE")]
  pub font: PathBuf,

  /// 标注帧输出目录
  #[arg(long, value_name = "DIR")]
  pub output: PathBuf,

  /// 驱动帧率
  #[arg(long, default_value = "30.0", value_name = "FPS")]
  pub fps: f64,

  /// 最大渲染周期数（0 表示不限）
  #[arg(long, default_value = "0", value_name = "COUNT")]
  pub max_cycles: u64,
}
