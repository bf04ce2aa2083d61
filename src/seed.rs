//! Baseline seed data
//!
//! Published starter SOPs and the two-week orientation curriculum.
//! Idempotent: existing titles are skipped, so re-running is safe.

use diesel::prelude::*;
use serde::Serialize;
use tracing::info;

use crate::db::diesel_schema::{onboarding_modules, sop_documents};
use crate::db::{
    documents, onboarding, CreateDocumentInput, CreateModuleInput, CreateTaskInput, SopDb,
};
use crate::error::SopdeskError;

/// Outcome of a seeding run
#[derive(Debug, Clone, Default, Serialize)]
pub struct SeedReport {
    pub sops_created: u64,
    pub sops_skipped: u64,
    pub modules_created: u64,
    pub modules_skipped: u64,
    pub tasks_created: u64,
}

struct SeedSop {
    title: &'static str,
    category: &'static str,
    purpose: &'static str,
    content: &'static str,
    tags: &'static [&'static str],
}

struct SeedModule {
    title: &'static str,
    description: &'static str,
    phase: &'static str,
    sequence_order: i32,
    estimated_hours: f32,
    steps: &'static [&'static str],
}

const SEED_SOPS: &[SeedSop] = &[
    SeedSop {
        title: "Technical SEO Site Audit",
        category: "TechnicalSEO",
        purpose: "Run a full technical crawl and prioritize fixes",
        content: "1. Crawl the site\n2. Review index coverage\n3. Check canonical tags\n4. File prioritized fixes",
        tags: &["audit", "crawl"],
    },
    SeedSop {
        title: "Content Brief Production",
        category: "Content",
        purpose: "Produce a keyword-driven brief for writers",
        content: "1. Pull target keywords\n2. Outline headings\n3. Define internal links\n4. Hand off to the writer",
        tags: &["brief", "keywords"],
    },
    SeedSop {
        title: "Backlink Outreach Sequence",
        category: "LinkBuilding",
        purpose: "Standard three-touch outreach for link prospects",
        content: "1. Qualify the prospect\n2. Send the first touch\n3. Follow up twice, a week apart",
        tags: &["outreach"],
    },
    SeedSop {
        title: "Monthly Reporting Checklist",
        category: "Analytics",
        purpose: "Assemble the monthly client performance report",
        content: "1. Export traffic data\n2. Annotate ranking movements\n3. Summarize wins and risks",
        tags: &["reporting"],
    },
    SeedSop {
        title: "Tool Access Provisioning",
        category: "ToolAccess",
        purpose: "Grant a new hire the standard tool stack",
        content: "1. Create accounts\n2. Assign seats\n3. Record credentials in the vault",
        tags: &["onboarding", "access"],
    },
];

const SEED_MODULES: &[SeedModule] = &[
    SeedModule {
        title: "Week One: Orientation",
        description: "Meet the team and learn how the agency runs",
        phase: "Orientation",
        sequence_order: 1,
        estimated_hours: 4.0,
        steps: &[
            "Read the agency handbook",
            "Meet your mentor",
            "Set up the standard tool stack",
        ],
    },
    SeedModule {
        title: "Week Two: Core SOPs",
        description: "Work through the core procedures with your mentor",
        phase: "Orientation",
        sequence_order: 2,
        estimated_hours: 6.0,
        steps: &[
            "Shadow a technical site audit",
            "Draft a content brief from a live request",
            "Walk through the monthly reporting checklist",
        ],
    },
];

/// Seed baseline SOPs and onboarding modules
pub fn seed_baseline(db: &SopDb) -> Result<SeedReport, SopdeskError> {
    let mut report = SeedReport::default();

    db.with_conn(|conn| {
        for sop in SEED_SOPS {
            let exists: i64 = sop_documents::table
                .filter(sop_documents::title.eq(sop.title))
                .count()
                .get_result(conn)
                .map_err(|e| SopdeskError::Database(format!("Query failed: {}", e)))?;
            if exists > 0 {
                report.sops_skipped += 1;
                continue;
            }

            let created = documents::create_document(
                conn,
                None,
                CreateDocumentInput {
                    title: sop.title.into(),
                    category: sop.category.into(),
                    purpose: sop.purpose.into(),
                    content: sop.content.into(),
                    tags: sop.tags.iter().map(|t| t.to_string()).collect(),
                    ..Default::default()
                },
            )?;
            documents::publish_document(conn, &created.document.id)?;
            report.sops_created += 1;
            info!(title = %sop.title, "Seeded SOP");
        }

        for module in SEED_MODULES {
            let exists: i64 = onboarding_modules::table
                .filter(onboarding_modules::title.eq(module.title))
                .count()
                .get_result(conn)
                .map_err(|e| SopdeskError::Database(format!("Query failed: {}", e)))?;
            if exists > 0 {
                report.modules_skipped += 1;
                continue;
            }

            let created = onboarding::create_module(
                conn,
                CreateModuleInput {
                    title: module.title.into(),
                    description: Some(module.description.into()),
                    phase: module.phase.into(),
                    sequence_order: module.sequence_order,
                    is_required: true,
                    estimated_hours: Some(module.estimated_hours),
                    ..Default::default()
                },
            )?;
            report.modules_created += 1;
            info!(title = %module.title, "Seeded module");

            for (i, step) in module.steps.iter().enumerate() {
                onboarding::create_task(
                    conn,
                    CreateTaskInput {
                        module_id: created.id.clone(),
                        title: (*step).into(),
                        description: Some((*step).into()),
                        task_type: "manual".into(),
                        sequence_order: (i + 1) as i32,
                        is_required: true,
                        ..Default::default()
                    },
                )?;
                report.tasks_created += 1;
            }
        }

        Ok(())
    })?;

    Ok(report)
}
