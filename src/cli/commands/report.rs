use clap::Subcommand;
use std::path::Path;

use crate::analytics::Aggregator;
use crate::cli::{open_store, utils::print_json, OutputFormat};
use crate::config::AppConfig;
use crate::filter::{FacultyFilter, ProjectFilter, PublicationFilter};

#[derive(Subcommand)]
pub enum ReportCommands {
    #[command(about = "Institution-wide dashboard summary")]
    Dashboard,

    #[command(about = "Analytics for one department")]
    Department {
        #[arg(help = "Department id")]
        dept_id: i32,
    },

    #[command(about = "Publication counts per department")]
    PublicationsByDepartment,

    #[command(about = "Yearly funding series (project budgets plus allocations)")]
    FundingTrends,

    #[command(about = "Funding totals by source type, year and top sources")]
    FundingSummary,

    #[command(about = "Projects funded by one source")]
    FundingSource {
        #[arg(help = "Funding source id")]
        funding_id: i32,
    },

    #[command(about = "Publication report with optional filters")]
    Publications {
        #[arg(long, help = "Department of the linked project")]
        dept_id: Option<i32>,
        #[arg(long, help = "Publication year")]
        year: Option<i32>,
        #[arg(long = "type", help = "Publication type, e.g. 'Journal Article'")]
        publication_type: Option<String>,
    },

    #[command(about = "Faculty listing with position breakdown")]
    Faculty {
        #[arg(long)]
        dept_id: Option<i32>,
        #[arg(long)]
        position: Option<String>,
    },

    #[command(about = "Project listing with budget summary")]
    Projects {
        #[arg(long)]
        dept_id: Option<i32>,
        #[arg(long)]
        status: Option<String>,
    },
}

pub async fn handle(
    cmd: ReportCommands,
    config: &AppConfig,
    fixture: Option<&Path>,
    output_format: OutputFormat,
) -> anyhow::Result<()> {
    let store = open_store(config, fixture).await?;
    let aggregator = Aggregator::new(store, config.analytics.active_rule.clone());

    match cmd {
        ReportCommands::Dashboard => print_json(&aggregator.dashboard_summary().await?, output_format),
        ReportCommands::Department { dept_id } => {
            print_json(&aggregator.department_analytics(dept_id).await?, output_format)
        }
        ReportCommands::PublicationsByDepartment => {
            print_json(&aggregator.publications_by_department().await?, output_format)
        }
        ReportCommands::FundingTrends => print_json(&aggregator.funding_trends().await?, output_format),
        ReportCommands::FundingSummary => print_json(&aggregator.funding_summary().await?, output_format),
        ReportCommands::FundingSource { funding_id } => {
            print_json(&aggregator.funding_source_report(funding_id).await?, output_format)
        }
        ReportCommands::Publications { dept_id, year, publication_type } => {
            let filter = PublicationFilter { dept_id, year, publication_type };
            print_json(&aggregator.publication_report(filter).await?, output_format)
        }
        ReportCommands::Faculty { dept_id, position } => {
            let filter = FacultyFilter { dept_id, position };
            print_json(&aggregator.faculty_report(filter).await?, output_format)
        }
        ReportCommands::Projects { dept_id, status } => {
            let filter = ProjectFilter { dept_id, status };
            print_json(&aggregator.project_report(filter).await?, output_format)
        }
    }
}
