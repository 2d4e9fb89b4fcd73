use crate::output::{print_json, print_table};
use anyhow::Context;
use clap::Subcommand;
use roster_core::{
    config::Config,
    snapshot::{Member, MemberRoster},
    types::ComplianceStatus,
};
use serde::Serialize;
use std::path::Path;

#[derive(Subcommand)]
pub enum MemberSubcommand {
    /// List members with their status and failing criteria
    List,

    /// Show one member's compliance against every enabled criterion
    Show { id: String },
}

#[derive(Serialize)]
struct CriterionStanding {
    criterion: String,
    /// `None` when the member has no readable snapshot for the criterion.
    status: Option<ComplianceStatus>,
}

pub fn run(root: &Path, subcmd: MemberSubcommand, json: bool) -> anyhow::Result<()> {
    let config = Config::load(root).context("failed to load config")?;
    let roster = MemberRoster::load(root).context("failed to load members")?;

    match subcmd {
        MemberSubcommand::List => list(&config, &roster, json),
        MemberSubcommand::Show { id } => show(&config, roster.member(&id)?, json),
    }
}

fn standings(config: &Config, member: &Member) -> Vec<CriterionStanding> {
    config
        .criteria
        .iter()
        .filter(|c| c.enabled)
        .map(|c| CriterionStanding {
            criterion: c.id.clone(),
            status: member.status_for(c),
        })
        .collect()
}

fn failing(standings: &[CriterionStanding]) -> Vec<&str> {
    standings
        .iter()
        .filter(|s| s.status == Some(ComplianceStatus::NonCompliant))
        .map(|s| s.criterion.as_str())
        .collect()
}

fn list(config: &Config, roster: &MemberRoster, json: bool) -> anyhow::Result<()> {
    if json {
        return print_json(&roster.members);
    }
    if roster.members.is_empty() {
        println!("No members. Add them to .roster/members.yaml");
        return Ok(());
    }

    let rows: Vec<Vec<String>> = roster
        .members
        .iter()
        .map(|m| {
            let s = standings(config, m);
            vec![
                m.id.clone(),
                m.name.clone(),
                m.status.to_string(),
                failing(&s).join(", "),
            ]
        })
        .collect();
    print_table(&["ID", "NAME", "STATUS", "NON-COMPLIANT"], &rows);
    Ok(())
}

fn show(config: &Config, member: &Member, json: bool) -> anyhow::Result<()> {
    let standings = standings(config, member);
    if json {
        return print_json(&serde_json::json!({
            "member": member,
            "standings": standings,
        }));
    }

    println!("Member:  {} ({})", member.name, member.id);
    println!("Status:  {}", member.status);
    let rows: Vec<Vec<String>> = standings
        .iter()
        .map(|s| {
            vec![
                s.criterion.clone(),
                s.status
                    .map(|st| st.to_string())
                    .unwrap_or_else(|| "no data".to_string()),
            ]
        })
        .collect();
    print_table(&["CRITERION", "COMPLIANCE"], &rows);
    Ok(())
}
