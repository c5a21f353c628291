//! panelkit-demo - builds a measurement panel from worker threads and prints
//! the resulting node tree as JSON.

use std::sync::Arc;
use std::thread;

use panelkit::log;
use panelkit::layout::SectionedFieldLayout;
use panelkit::shared::PanelConfig;
use panelkit::widget::{
    CheckGrid, ConfigurableGrid, Container, Element, ElementRef, FieldValue, Grid, Label,
    ListDisplay, NodeSnapshot, Stack, TabGroup,
};
use panelkit::{Dispatcher, PresentationEngine};

/// Polling rounds each simulated instrument performs
const POLL_ROUNDS: usize = 20;

fn main() {
    let config = PanelConfig::load();
    let log_path = log::init(&config.log);
    log!("main() starting, log file {:?}", log_path);

    let engine = Arc::new(PresentationEngine::new(&config.engine));
    if PresentationEngine::install_global(engine).is_err() {
        log!("Global engine already installed, reusing it");
    }

    let dispatcher = Dispatcher::global();
    if let Err(e) = dispatcher.engine().ensure_started() {
        log!("FATAL: engine did not start: {}", e);
        eprintln!("panelkit-demo: {}", e);
        std::process::exit(1);
    }

    let snapshot = match build_panel(&dispatcher, &config) {
        Ok(snapshot) => snapshot,
        Err(e) => {
            log!("FATAL: building the panel failed: {}", e);
            eprintln!("panelkit-demo: {}", e);
            std::process::exit(1);
        }
    };

    match serde_json::to_string_pretty(&snapshot) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("panelkit-demo: cannot serialize node tree: {}", e);
            std::process::exit(1);
        }
    }

    log!("panelkit-demo exited normally.");
}

fn build_panel(dispatcher: &Dispatcher, config: &PanelConfig) -> panelkit::Result<NodeSnapshot> {
    let root = Stack::new(dispatcher, "panelkit demo");
    let tabs = Arc::new(TabGroup::new(dispatcher, "Tabs"));
    root.add(tabs.clone())?;

    // Measurement parameters
    let fields = Arc::new(SectionedFieldLayout::with_settings(
        dispatcher,
        "Measurement",
        &config.layout,
    )?);
    let source_drain = fields.add_section("Source-Drain")?;
    let gate = fields.add_section("Gate")?;
    let timing = fields.add_section("Timing")?;

    let channels = vec![
        source_drain.add_double_field("Voltage [V]", 0.0)?,
        gate.add_double_field("Voltage [V]", 0.0)?,
        timing.add_double_field("Delay [s]", 0.5)?,
    ];
    source_drain.add_check_box("Four-wire", false)?;
    timing.add_text_field("Output file", "results.csv")?;
    tabs.add(fields.clone())?;

    // Instrument rows shown per configuration
    let instruments = Arc::new(ConfigurableGrid::new(dispatcher, "Instruments"));
    instruments.add_tagged(Label::shared(dispatcher, "SMU"), &[0, 1])?;
    instruments.add_tagged(Label::shared(dispatcher, "Lock-in"), &[1])?;
    instruments.add_tagged(Label::shared(dispatcher, "Thermometer"), &[0])?;
    tabs.add(instruments.clone())?;

    let readouts = Arc::new(Grid::new(dispatcher, "Readouts", config.layout.grid_columns));
    for name in ["I_SD", "I_G", "T", "R"] {
        readouts.add(Label::shared(dispatcher, name))?;
    }
    tabs.add(readouts.clone())?;

    let pixels = Arc::new(CheckGrid::new(dispatcher, "Pixels", 4, 3)?);
    pixels.set_row(1, false)?;
    tabs.add(pixels.clone())?;

    let results = Arc::new(ListDisplay::new(dispatcher, "Log"));
    tabs.add(results.clone())?;

    // Simulated instrument polling from worker threads
    let sections = [source_drain, gate, timing];
    let workers: Vec<_> = sections
        .into_iter()
        .zip(channels)
        .enumerate()
        .map(|(i, (section, handle))| {
            let results = Arc::clone(&results);
            thread::spawn(move || -> panelkit::Result<()> {
                for round in 0..POLL_ROUNDS {
                    let reading = (i + 1) as f64 * round as f64 / POLL_ROUNDS as f64;
                    section.set_value(handle, FieldValue::Number(reading))?;
                }
                results.add(&section.title(), "polling finished")?;
                Ok(())
            })
        })
        .collect();

    for worker in workers {
        match worker.join() {
            Ok(outcome) => outcome?,
            Err(_) => log!("A polling worker panicked"),
        }
    }

    instruments.set_configuration(1)?;
    instruments.set_configuration(0)?;
    fields.set_num_columns(2)?;

    let visible: Vec<ElementRef> = instruments.visible_elements()?;
    log!(
        "{} instruments visible in configuration {}",
        visible.len(),
        instruments.configuration()
    );

    tabs.select(0)?;
    Ok(root.node().snapshot())
}
