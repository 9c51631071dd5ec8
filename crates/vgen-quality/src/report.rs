//! Project-level quality report and render decision.
//!
//! The report is regenerated from the live scene list on every query;
//! blocking reasons are never cached and re-trusted. Mutators re-derive
//! the whole report instead of patching aggregates incrementally.

use serde::{Deserialize, Serialize};

use crate::status::{IssueSeverity, SceneQualityStatus, SceneStatus};

/// Minimum mean score required to render a project.
pub const MIN_PROJECT_SCORE: f64 = 75.0;
/// Maximum critical issues allowed across a project.
pub const MAX_CRITICAL_ISSUES: usize = 0;
/// Maximum major issues allowed across a project.
pub const MAX_MAJOR_ISSUES: usize = 3;

/// Aggregate quality report for all scenes of a project.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectQualityReport {
    pub scenes: Vec<SceneQualityStatus>,
    pub approved_count: usize,
    pub rejected_count: usize,
    pub needs_review_count: usize,
    pub pending_count: usize,
    pub critical_issue_count: usize,
    pub major_issue_count: usize,
    /// Mean of scene scores (0 when there are no scenes)
    pub overall_score: f64,
    /// Human-readable reasons the render is currently disallowed
    pub blocking_reasons: Vec<String>,
    /// Strict policy: render is allowed iff no blocking reasons exist
    pub can_render: bool,
}

impl ProjectQualityReport {
    /// Build a report from the current scene statuses.
    ///
    /// `require_user_approval` adds a blocking reason when any scene is
    /// still awaiting review.
    pub fn from_scenes(scenes: Vec<SceneQualityStatus>, require_user_approval: bool) -> Self {
        let approved_count = count_status(&scenes, SceneStatus::Approved);
        let rejected_count = count_status(&scenes, SceneStatus::Rejected);
        let needs_review_count = count_status(&scenes, SceneStatus::NeedsReview);
        let pending_count = count_status(&scenes, SceneStatus::Pending);

        let critical_issue_count: usize = scenes
            .iter()
            .map(|s| s.issue_count(IssueSeverity::Critical))
            .sum();
        let major_issue_count: usize = scenes
            .iter()
            .map(|s| s.issue_count(IssueSeverity::Major))
            .sum();

        let overall_score = if scenes.is_empty() {
            0.0
        } else {
            scenes.iter().map(|s| f64::from(s.score)).sum::<f64>() / scenes.len() as f64
        };

        // Reason ordering is part of the contract: score, critical issues,
        // major issues, rejections, pending review.
        let mut blocking_reasons = Vec::new();
        if overall_score < MIN_PROJECT_SCORE {
            blocking_reasons.push(format!(
                "overall score {overall_score:.1} is below the minimum of {MIN_PROJECT_SCORE:.0}"
            ));
        }
        if critical_issue_count > MAX_CRITICAL_ISSUES {
            blocking_reasons.push(format!(
                "{critical_issue_count} critical issue(s) found (maximum {MAX_CRITICAL_ISSUES})"
            ));
        }
        if major_issue_count > MAX_MAJOR_ISSUES {
            blocking_reasons.push(format!(
                "{major_issue_count} major issue(s) found (maximum {MAX_MAJOR_ISSUES})"
            ));
        }
        if rejected_count > 0 {
            blocking_reasons.push(format!("{rejected_count} scene(s) rejected"));
        }
        if require_user_approval && needs_review_count > 0 {
            blocking_reasons.push(format!(
                "{needs_review_count} scene(s) awaiting review"
            ));
        }

        let can_render = blocking_reasons.is_empty();

        Self {
            scenes,
            approved_count,
            rejected_count,
            needs_review_count,
            pending_count,
            critical_issue_count,
            major_issue_count,
            overall_score,
            blocking_reasons,
            can_render,
        }
    }

    /// Approve one scene by index and re-derive the report.
    pub fn approve_scene(self, scene_index: u32, require_user_approval: bool) -> Self {
        let scenes = self
            .scenes
            .into_iter()
            .map(|mut s| {
                if s.scene_index == scene_index {
                    s.user_approved = true;
                    s.status = SceneStatus::Approved;
                }
                s
            })
            .collect();
        Self::from_scenes(scenes, require_user_approval)
    }

    /// Reject one scene by index and re-derive the report.
    pub fn reject_scene(self, scene_index: u32, require_user_approval: bool) -> Self {
        let scenes = self
            .scenes
            .into_iter()
            .map(|mut s| {
                if s.scene_index == scene_index {
                    s.user_approved = false;
                    s.auto_approved = false;
                    s.status = SceneStatus::Rejected;
                    // A rejection queues the scene for regeneration.
                    s.regeneration_count += 1;
                }
                s
            })
            .collect();
        Self::from_scenes(scenes, require_user_approval)
    }

    /// Auto-approve every scene whose score clears the threshold and
    /// re-derive the report.
    pub fn auto_approve_eligible(self, require_user_approval: bool) -> Self {
        let scenes = self
            .scenes
            .into_iter()
            .map(|mut s| {
                if s.status == SceneStatus::NeedsReview
                    && s.score >= crate::status::AUTO_APPROVE_SCORE
                {
                    s.auto_approved = true;
                    s.status = SceneStatus::Approved;
                }
                s
            })
            .collect();
        Self::from_scenes(scenes, require_user_approval)
    }
}

fn count_status(scenes: &[SceneQualityStatus], status: SceneStatus) -> usize {
    scenes.iter().filter(|s| s.status == status).count()
}
