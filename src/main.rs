//! LED Cube CLI - Export, convert and stream cube animations.

use std::fs;
use std::path::Path;
use std::process;

use ledcube::{
    animation::{
        CompressionType, ExportEncoder, ExportFormat, PlaybackOutcome, Player, load_container,
        save_container,
    },
    device::{
        ChannelOpener, DeviceStreamer, FileChannelOpener, MemoryChannel, MemoryChannelOpener,
    },
    schema::{AnimationDocument, CubeConfig, ExportConfig},
    voxel::{Frame, Transform},
};

fn main() {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_usage(&args[0]);
        process::exit(1);
    }

    let result = match args[1].as_str() {
        "--example" => {
            print_example();
            Ok(())
        }
        "export" => cmd_export(&args[2..]),
        "stream" => cmd_stream(&args[2..]),
        "convert" => cmd_convert(&args[2..]),
        "info" => cmd_info(&args[2..]),
        "play" => cmd_play(&args[2..]),
        _ => {
            print_usage(&args[0]);
            process::exit(1);
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn print_usage(program: &str) {
    eprintln!("Usage: {} <command> [args]", program);
    eprintln!();
    eprintln!("Tooling for 8x8x8 LED cube animations.");
    eprintln!();
    eprintln!("Commands:");
    eprintln!("  export <anim> [array|header|sketch] [name]  Print animation as byte-array source");
    eprintln!("  stream <anim> <config.json> [--dry-run]     Stream animation to the configured device");
    eprintln!("  convert <in> <out> [transform]              Convert between .json and .lcub");
    eprintln!("  info <anim>                                 Summarize an animation");
    eprintln!("  play <anim> [config.json]                   Print frames at the playback rate");
    eprintln!("  --example                                   Print example config and animation");
    eprintln!();
    eprintln!("Animations are read from .json documents or .lcub containers.");
}

type CliResult = Result<(), Box<dyn std::error::Error>>;

fn is_container(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "lcub")
}

/// Load frames and their frame delay from either file format.
fn load_frames(path: &Path) -> Result<(Vec<Frame>, u64), Box<dyn std::error::Error>> {
    if is_container(path) {
        let (header, frames) = load_container(path)?;
        Ok((frames, u64::from(header.frame_delay_ms)))
    } else {
        let doc = AnimationDocument::load(path)?;
        Ok((doc.to_frames(), doc.frame_delay_ms))
    }
}

fn load_config(path: &Path) -> Result<CubeConfig, Box<dyn std::error::Error>> {
    let config: CubeConfig = serde_json::from_str(&fs::read_to_string(path)?)?;
    Ok(config)
}

fn cmd_export(args: &[String]) -> CliResult {
    let path = args.first().ok_or("export needs an animation file")?;
    let mut export = ExportConfig::default();
    if let Some(f) = args.get(1) {
        export.format = f.parse::<ExportFormat>()?;
    }
    if let Some(name) = args.get(2) {
        export.name = name.clone();
    }
    export.validate()?;

    let (frames, delay) = load_frames(Path::new(path))?;
    let encoder = ExportEncoder::new(export.format)
        .with_frame_delay(delay.try_into().unwrap_or(u32::MAX));
    print!("{}", encoder.encode(&frames, &export.name));
    Ok(())
}

fn cmd_stream(args: &[String]) -> CliResult {
    let anim_path = args.first().ok_or("stream needs an animation file")?;
    let config_path = args.get(1).ok_or("stream needs a config file")?;
    let dry_run = args.iter().any(|a| a == "--dry-run");

    let config = load_config(Path::new(config_path))?;
    config.stream.validate()?;
    let (frames, _) = load_frames(Path::new(anim_path))?;

    println!("LED Cube Stream");
    println!("===============");
    println!("Device: {}", config.stream.descriptor);
    println!(
        "Baud: {} (not applied; configure the port first, e.g. stty -F <device> {} raw)",
        config.stream.baud, config.stream.baud
    );
    println!(
        "Frame delay: {} ms",
        config.stream.effective_delay().as_millis()
    );
    println!("Frames: {}", frames.len());
    println!();

    let probe = MemoryChannel::new();
    let memory = MemoryChannelOpener::new(probe.clone());
    let opener: &dyn ChannelOpener = if dry_run { &memory } else { &FileChannelOpener };

    let mut streamer = DeviceStreamer::new(&config.stream);
    streamer.connect(opener, &config.stream)?;
    let outcome = streamer.stream(&frames);
    let closed = streamer.disconnect();

    let report = outcome?;
    closed?;
    println!("{}", report);
    if dry_run {
        println!("Dry run: {} writes captured", probe.write_count());
    }
    Ok(())
}

fn cmd_convert(args: &[String]) -> CliResult {
    let input = Path::new(args.first().ok_or("convert needs an input file")?);
    let output = Path::new(args.get(1).ok_or("convert needs an output file")?);
    let transform = match args.get(2) {
        Some(name) => Some(
            Transform::from_name(name).ok_or_else(|| format!("unknown transform '{}'", name))?,
        ),
        None => None,
    };

    let (mut frames, delay) = load_frames(input)?;
    if let Some(t) = transform {
        for frame in &mut frames {
            *frame = t.apply(frame);
        }
    }

    if is_container(output) {
        save_container(
            output,
            &frames,
            delay.try_into().unwrap_or(u32::MAX),
            CompressionType::Lz4,
        )?;
    } else {
        AnimationDocument::from_frames(&frames, delay).save(output)?;
    }
    println!("Wrote {} frames to {}", frames.len(), output.display());
    Ok(())
}

fn cmd_info(args: &[String]) -> CliResult {
    let path = args.first().ok_or("info needs an animation file")?;
    let (frames, delay) = load_frames(Path::new(path))?;

    println!("Animation: {}", path);
    println!("  Frames: {}", frames.len());
    println!("  Frame delay: {} ms", delay);
    for (i, frame) in frames.iter().enumerate() {
        println!("  Frame {:>3}: {:>3} voxels lit", i, frame.lit_count());
    }
    Ok(())
}

fn cmd_play(args: &[String]) -> CliResult {
    let path = args.first().ok_or("play needs an animation file")?;
    let playback = match args.get(1) {
        Some(config_path) => load_config(Path::new(config_path))?.playback,
        None => CubeConfig::default().playback,
    };
    playback.validate()?;
    let (frames, _) = load_frames(Path::new(path))?;

    let mut player = Player::new(playback);
    println!(
        "Playing {} frames every {} ms",
        frames.len(),
        player.interval().as_millis()
    );
    let outcome = player.play(&frames, |i, frame| {
        println!("  Frame {:>3}: {:>3} voxels lit", i, frame.lit_count());
    });
    match outcome {
        PlaybackOutcome::Completed { frames_shown } => println!("Done ({} frames)", frames_shown),
        PlaybackOutcome::Stopped { frames_shown } => {
            println!("Stopped after {} frames", frames_shown)
        }
    }
    Ok(())
}

fn print_example() {
    let mut config = CubeConfig::default();
    config.stream.descriptor = "/dev/ttyUSB0".to_string();

    let mut frame = Frame::blank();
    frame.set_layer(0, true);
    let frames = [frame, Transform::MirrorZ.apply(&frame)];
    let doc = AnimationDocument::from_frames(&frames, config.stream.frame_delay_ms);

    println!("Example configuration (config.json):");
    match serde_json::to_string_pretty(&config) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Error serializing config: {}", e),
    }
    println!();
    println!("Example animation (anim.json):");
    match doc.to_json_pretty() {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Error serializing animation: {}", e),
    }
}
