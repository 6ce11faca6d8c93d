use std::{path::PathBuf, process::ExitCode, time::Duration};

use clap::Parser;
use nfq::Queue;
use tracing::{error, info};

use nfq_rewriter::{config::HostConfig, logging, modifier::element_classes, nfq_message::NfqMessage};

const BATCH_LIMIT: usize = 10000;

#[derive(Debug, Parser)]
#[command(name = "nfq_rewriter", about = "Swap or rewrite packet headers on NFQUEUE traffic")]
struct Cli {
    /// TOML 配置文件
    #[arg(short, long)]
    config: PathBuf,
}

fn make_queue(queue_num: u16, max_len: u32) -> Result<Queue, std::io::Error> {
    let mut q = Queue::open()?;
    q.bind(queue_num)?;
    q.set_copy_range(queue_num, 0xFFFF)?;
    q.set_queue_max_len(queue_num, max_len)?;
    q.set_nonblocking(true);
    Ok(q)
}

fn main() -> ExitCode {
    logging::init();
    let cli = Cli::parse();

    let config = match HostConfig::load(&cli.config) {
        Ok(config) => config,
        Err(err) => {
            error!(path = %cli.config.display(), %err, "bad config");
            return ExitCode::FAILURE;
        }
    };

    // 1. 元素链：任何一个配置错都不进入服务
    let mut pipeline = match config.build_pipeline() {
        Ok(pipeline) => pipeline,
        Err(err) => {
            error!(%err, known = ?element_classes(), "failed to build pipeline");
            return ExitCode::FAILURE;
        }
    };
    info!(elements = pipeline.len(), queues = ?config.queues, "pipeline ready");

    // 2. 打开所有队列
    let mut queues = Vec::with_capacity(config.queues.len());
    for &num in &config.queues {
        match make_queue(num, config.queue_max_len) {
            Ok(q) => queues.push(q),
            Err(err) => {
                error!(queue = num, %err, "failed to open queue");
                return ExitCode::FAILURE;
            }
        }
    }

    // 3. 主循环：一批一批收，逐包过管道，原队列回 verdict
    loop {
        let mut packet_count = 0;
        loop {
            if packet_count >= BATCH_LIMIT {
                break;
            }
            let mut no_packet = true;
            for queue in queues.iter_mut() {
                let Ok(msg) = queue.recv() else {
                    continue;
                };
                no_packet = false;
                packet_count += 1;

                let msg = NfqMessage::from(msg);
                let frame = msg.to_frame();
                let out = pipeline.process(frame);
                if let Err(err) = queue.verdict(msg.finish(out)) {
                    error!(%err, "verdict failed");
                }
            }
            if no_packet {
                break;
            }
        }

        if packet_count == 0 {
            std::thread::sleep(Duration::from_micros(100));
        }
    }
}
