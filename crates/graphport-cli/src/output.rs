//! Terminal output formatting.

use colored::Colorize;
use graphport_core::{DerivationRule, RelationStrategy, TypeDescriptor};
use graphport_graph::report::format_elapsed;
use graphport_graph::{ImportReport, RunStatus};

/// Print the outcome of an import run.
pub fn print_report(report: &ImportReport) {
    let status = match report.status() {
        RunStatus::Succeeded => report.status().as_str().green().bold(),
        RunStatus::SucceededWithWarnings => report.status().as_str().yellow().bold(),
    };

    println!();
    println!("{} {}", "Import".bold(), status);
    println!("{}", "─".repeat(40));
    println!("  Top level pathways:    {}", report.roots_imported);
    println!(
        "  Nodes created:         {} {}",
        report.nodes_created.to_string().cyan(),
        format!("(expected {})", report.expected_total).dimmed()
    );
    println!("  Relationships created: {}", report.relationships_created.to_string().cyan());
    println!("  Constraints created:   {}", report.constraints_created);
    println!("  Indexes created:       {}", report.indexes_created);
    println!("  Elapsed:               {}", format_elapsed(report.elapsed));

    if !report.warnings.is_empty() {
        println!();
        println!("{}", "Warnings".yellow().bold());
        for (kind, count) in report.warnings.iter() {
            println!("  {:<24} {}", kind.as_str(), count);
        }
    }
}

/// Print labels and attribute classification of a type.
pub fn print_descriptor(descriptor: &TypeDescriptor) {
    println!("{}", descriptor.name.cyan().bold());
    println!("{}: {}", "Labels".bold(), descriptor.labels.join(", "));

    print_attributes("Scalars", &descriptor.scalars);
    print_attributes("Scalar lists", &descriptor.scalar_lists);
    print_attributes("Relationships", &descriptor.relationships);
}

fn print_attributes(heading: &str, attributes: &[String]) {
    println!();
    println!("{} ({})", heading.bold(), attributes.len());
    if attributes.is_empty() {
        println!("  {}", "none".dimmed());
        return;
    }
    for attribute in attributes {
        let note = if DerivationRule::for_attribute(attribute).is_some() {
            "derived".dimmed().to_string()
        } else if RelationStrategy::for_attribute(attribute).is_some() {
            "materialized from another attribute".dimmed().to_string()
        } else {
            String::new()
        };
        println!("  {} {}", attribute, note);
    }
}
