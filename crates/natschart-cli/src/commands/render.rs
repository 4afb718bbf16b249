//! Render command

use clap::Args;
use natschart_harness::Resources;

use super::{format_value, ChartArgs, OutputFormat};
use crate::{Error, Result};

#[derive(Args, Debug)]
pub struct RenderArgs {
    #[command(flatten)]
    pub chart: ChartArgs,

    /// Print the value of one slot instead of the slot listing
    #[arg(long)]
    pub show: Option<String>,

    /// Format for --show
    #[arg(long, short = 'o', value_enum, default_value_t)]
    pub output: OutputFormat,
}

pub fn run(args: RenderArgs) -> Result<()> {
    let case = args.chart.test_case()?;
    let resources = args.chart.renderer().render(&case)?;

    match &args.show {
        Some(id) => print!("{}", show_slot(&resources, id, args.output)?),
        None => print!("{}", slot_listing(&resources)),
    }
    Ok(())
}

/// One line per slot, in registry order
pub fn slot_listing(resources: &Resources) -> String {
    resources
        .entries()
        .into_iter()
        .map(|slot| {
            let state = if slot.is_present() { "present" } else { "absent" };
            format!("{state:<8} {}\n", slot.id())
        })
        .collect()
}

fn show_slot(resources: &Resources, id: &str, output: OutputFormat) -> Result<String> {
    let slot = resources.entry(id).ok_or_else(|| Error::unknown_slot(id))?;
    match slot.snapshot() {
        Some(value) => {
            let mut text = format_value(&value, output)?;
            if !text.ends_with('\n') {
                text.push('\n');
            }
            Ok(text)
        }
        None => Ok(format!("{id} was not rendered\n")),
    }
}
