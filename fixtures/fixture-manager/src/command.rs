// Copyright (c) The mlca Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use camino::Utf8PathBuf;
use clap::{ArgEnum, Args, Parser, Subcommand};
use color_eyre::{
    eyre::{eyre, WrapErr},
    Result,
};
use fixture_details::AllFixtures;
use itertools::Itertools;
use mlca::{
    analysis::AnalysisReport,
    config::{AnalysisConfig, Strategy, StructureMode},
};

#[derive(Debug, Parser)]
pub struct FixtureManagerApp {
    #[clap(subcommand)]
    command: FixtureManagerCommand,
}

#[derive(Debug, Subcommand)]
pub enum FixtureManagerCommand {
    /// Write the known scenarios and seeded random fixtures to the data directory.
    GenerateInputs {
        #[clap(long, short, default_value_t = 64)]
        count: usize,
    },
    /// Analyze every fixture and write the reports as JSON.
    GenerateOutputs {
        #[clap(flatten)]
        opts: AnalyzeOpts,
    },
    /// Analyze one fixture and print its models.
    Analyze {
        /// The fixture's name.
        name: String,

        #[clap(flatten)]
        opts: AnalyzeOpts,

        /// Print the full report as JSON.
        #[clap(long)]
        json: bool,
    },
}

#[derive(Debug, Args)]
pub struct AnalyzeOpts {
    /// How relations are derived from data; overrides the configuration file.
    #[clap(long, arg_enum)]
    strategy: Option<StrategyArg>,

    /// Allow composite resolutions of circular relations.
    #[clap(long)]
    complex: bool,

    /// TOML file with analysis settings.
    #[clap(long)]
    config: Option<Utf8PathBuf>,
}

#[derive(ArgEnum, Clone, Copy, Debug)]
pub enum StrategyArg {
    TopDown,
    BottomUp,
}

impl FixtureManagerApp {
    pub fn exec(self) -> Result<()> {
        self.command.exec()
    }
}

impl FixtureManagerCommand {
    pub fn exec(self) -> Result<()> {
        match self {
            Self::GenerateInputs { count } => {
                AllFixtures::generate_inputs(&AllFixtures::default_dir(), count)
            }
            Self::GenerateOutputs { opts } => {
                let config = opts.analysis_config()?;
                AllFixtures::get().generate_outputs(&config)
            }
            Self::Analyze { name, opts, json } => {
                let config = opts.analysis_config()?;
                let fixture = AllFixtures::get()
                    .fixture(&name)
                    .ok_or_else(|| eyre!("unknown fixture `{}`", name))?;
                let report = fixture
                    .analyze(config)
                    .wrap_err_with(|| format!("analyzing {}", name))?;
                if json {
                    println!("{}", serde_json::to_string_pretty(&report)?);
                } else {
                    print_report(&report);
                }
                Ok(())
            }
        }
    }
}

impl AnalyzeOpts {
    fn analysis_config(&self) -> Result<AnalysisConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let contents = std::fs::read_to_string(path)
                    .wrap_err_with(|| format!("reading {}", path))?;
                AnalysisConfig::from_toml_str(&contents)
                    .wrap_err_with(|| format!("parsing {}", path))?
            }
            None => AnalysisConfig::default(),
        };
        if let Some(strategy) = self.strategy {
            config.strategy = match strategy {
                StrategyArg::TopDown => Strategy::TopDown,
                StrategyArg::BottomUp => Strategy::BottomUp,
            };
        }
        if self.complex {
            config.structure_mode = StructureMode::Complex;
        }
        config.validate()?;
        Ok(config)
    }
}

fn print_report(report: &AnalysisReport) {
    println!("relations:");
    for relation in &report.relations {
        println!("  {}", relation);
    }

    for (ix, model) in report.models.iter().enumerate() {
        println!("model {}:", ix + 1);
        for (level, level_model) in model.levels.iter().enumerate() {
            let orders = level_model
                .ordering
                .display_orders()
                .iter()
                .map(|order| format!("[{}]", order.iter().join(", ")))
                .join(" ");
            println!("  level {}: {}", level, orders);
            for relation in &level_model.relations {
                println!("    {}", relation);
            }
        }
        if !model.constitution.is_empty() {
            println!("  constitution:");
            for relation in &model.constitution {
                println!("    {}", relation);
            }
        }
    }

    if !report.unresolved.is_empty() {
        println!("unresolved:");
        for structure in &report.unresolved {
            println!("  {}", structure);
        }
    }
}
