use anyhow::{bail, Context};
use clap::Parser;
use nananana::generator::{
    EnvelopeConfig, EnvelopePhase, GeneratorState, PianoEnvelope, SignalGenerator,
};
use nananana::synth::{sample_count, DEFAULT_SAMPLE_RATE, FRAME_SIZE};
use plotters::prelude::*;

const DISCONTINUITY_THRESHOLD: f64 = 0.15;

/// Plot the piano envelope of one note as an SVG
#[derive(Parser, Debug)]
#[command(name = "plot-envelope")]
struct Args {
    /// Note length in milliseconds
    duration_ms: f64,
    /// Output SVG path
    output: String,
}

fn generate_envelope(
    duration_ms: f64,
    config: &EnvelopeConfig,
) -> anyhow::Result<(Vec<f64>, Vec<EnvelopePhase>)> {
    let total = sample_count(duration_ms / 1000.0, DEFAULT_SAMPLE_RATE);
    if total == 0 {
        bail!("note is too short to render: {}ms", duration_ms);
    }

    let mut envelope = PianoEnvelope::new(total, config.clone());
    let shape = envelope.shape();
    let mut samples = Vec::with_capacity(total);
    let mut frame = [0.0f64; FRAME_SIZE];

    while samples.len() < total {
        let wanted = (total - samples.len()).min(FRAME_SIZE);
        let state = envelope.process(&mut frame[..wanted]);
        samples.extend_from_slice(&frame[..wanted]);
        if state == GeneratorState::Complete {
            break;
        }
    }

    let phases = (0..samples.len()).map(|i| shape.phase_at(i)).collect();
    Ok((samples, phases))
}

fn check_discontinuities(samples: &[f64]) -> anyhow::Result<()> {
    let mut max_diff = 0.0f64;
    let mut max_diff_idx = 0usize;

    for i in 1..samples.len() {
        let diff = (samples[i] - samples[i - 1]).abs();
        if diff > max_diff {
            max_diff = diff;
            max_diff_idx = i;
        }
    }

    if max_diff > DISCONTINUITY_THRESHOLD {
        bail!(
            "discontinuity at sample {} ({:.2}ms): {:.4} -> {:.4}",
            max_diff_idx,
            to_ms(max_diff_idx),
            samples[max_diff_idx - 1],
            samples[max_diff_idx]
        );
    }

    println!(
        "  ✓ Max step: {:.6} at sample {} (below threshold {})",
        max_diff, max_diff_idx, DISCONTINUITY_THRESHOLD
    );
    Ok(())
}

fn to_ms(sample: usize) -> f64 {
    sample as f64 * 1000.0 / DEFAULT_SAMPLE_RATE as f64
}

fn create_plot(args: &Args, samples: &[f64], phases: &[EnvelopePhase]) -> anyhow::Result<()> {
    let root = SVGBackend::new(&args.output, (800, 400)).into_drawing_area();
    root.fill(&WHITE)?;

    let title = format!("Piano envelope: {}ms note", args.duration_ms);
    let mut chart = ChartBuilder::on(&root)
        .caption(&title, ("sans-serif", 20))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(0f64..args.duration_ms, 0f64..1.1f64)?;

    chart
        .configure_mesh()
        .x_desc("Time (ms)")
        .y_desc("Amplitude")
        .x_labels(10)
        .y_labels(10)
        .draw()?;

    chart.draw_series(LineSeries::new(
        samples.iter().enumerate().map(|(i, &s)| (to_ms(i), s)),
        BLUE.stroke_width(2),
    ))?;

    // Phase transitions
    for i in 1..phases.len() {
        if phases[i] != phases[i - 1] {
            chart.draw_series(std::iter::once(plotters::element::Cross::new(
                (to_ms(i), samples[i]),
                6,
                BLACK.filled(),
            )))?;
        }
    }

    root.present()?;
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    if !(args.duration_ms.is_finite() && args.duration_ms > 0.0) {
        bail!("duration must be positive, got {}", args.duration_ms);
    }

    let config = EnvelopeConfig::default();

    println!("Piano Envelope Plot");
    println!("===================");
    println!("  Duration: {}ms", args.duration_ms);
    println!("  Sustain: {:.2}", config.sustain_level);
    println!("  Release starts at: {:.0}%", config.release_start * 100.0);
    println!();

    print!("  Generating envelope... ");
    let (samples, phases) = generate_envelope(args.duration_ms, &config)?;
    println!("done ({} samples)", samples.len());

    check_discontinuities(&samples)?;

    print!("  Creating plot... ");
    create_plot(&args, &samples, &phases)
        .with_context(|| format!("failed to write {}", args.output))?;
    println!("done");

    println!();
    println!("Output: {}", args.output);
    Ok(())
}
