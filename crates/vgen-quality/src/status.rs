//! Per-scene quality status and the status derivation rule.

use serde::{Deserialize, Serialize};

/// Automated score at or above this auto-approves a scene.
pub const AUTO_APPROVE_SCORE: u8 = 85;
/// Automated score below this rejects a scene.
pub const MIN_SCENE_SCORE: u8 = 70;

/// Severity of a detected issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueSeverity {
    Critical,
    Major,
    Minor,
}

/// One issue found by automated analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityIssue {
    pub severity: IssueSeverity,
    pub description: String,
}

/// Automated analysis for one scene, supplied by an external analyzer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneAnalysis {
    /// Score 0-100
    pub score: u8,
    /// Issues found
    #[serde(default)]
    pub issues: Vec<QualityIssue>,
    /// Analyzer recommends regenerating the scene
    #[serde(default)]
    pub recommend_regeneration: bool,
}

/// Review state of one scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SceneStatus {
    #[default]
    Pending,
    NeedsReview,
    Approved,
    Rejected,
}

impl SceneStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SceneStatus::Pending => "pending",
            SceneStatus::NeedsReview => "needs_review",
            SceneStatus::Approved => "approved",
            SceneStatus::Rejected => "rejected",
        }
    }
}

/// Derive the review status for a scene from its analysis and any
/// explicit human approval.
///
/// Rules, in order:
/// - approved when the user approved it or the score clears the
///   auto-approve threshold
/// - rejected when the analyzer recommends regeneration or the score
///   falls below the minimum
/// - needs_review otherwise
pub fn derive_status(analysis: &SceneAnalysis, user_approved: bool) -> SceneStatus {
    if user_approved || analysis.score >= AUTO_APPROVE_SCORE {
        return SceneStatus::Approved;
    }
    if analysis.recommend_regeneration || analysis.score < MIN_SCENE_SCORE {
        return SceneStatus::Rejected;
    }
    SceneStatus::NeedsReview
}

/// Quality state for one scene of a project.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneQualityStatus {
    /// Scene index within the project
    pub scene_index: u32,
    /// Automated score 0-100
    pub score: u8,
    /// Derived review status
    pub status: SceneStatus,
    /// Issues from the last analysis
    #[serde(default)]
    pub issues: Vec<QualityIssue>,
    /// Explicitly approved by a human
    #[serde(default)]
    pub user_approved: bool,
    /// Approved automatically by score
    #[serde(default)]
    pub auto_approved: bool,
    /// Times this scene has been sent back for regeneration
    #[serde(default)]
    pub regeneration_count: u32,
}

impl SceneQualityStatus {
    /// Build the initial status from a fresh analysis.
    pub fn from_analysis(scene_index: u32, analysis: &SceneAnalysis) -> Self {
        let status = derive_status(analysis, false);
        Self {
            scene_index,
            score: analysis.score.min(100),
            status,
            issues: analysis.issues.clone(),
            user_approved: false,
            auto_approved: status == SceneStatus::Approved,
            regeneration_count: 0,
        }
    }

    /// Count issues at a given severity.
    pub fn issue_count(&self, severity: IssueSeverity) -> usize {
        self.issues.iter().filter(|i| i.severity == severity).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn analysis(score: u8) -> SceneAnalysis {
        SceneAnalysis {
            score,
            issues: vec![],
            recommend_regeneration: false,
        }
    }

    #[test]
    fn test_user_approval_wins() {
        // Even a failing score is approved when a human signs off.
        assert_eq!(derive_status(&analysis(10), true), SceneStatus::Approved);
    }

    #[test]
    fn test_auto_approve_threshold() {
        assert_eq!(derive_status(&analysis(85), false), SceneStatus::Approved);
        assert_eq!(derive_status(&analysis(84), false), SceneStatus::NeedsReview);
    }

    #[test]
    fn test_rejection_rules() {
        assert_eq!(derive_status(&analysis(69), false), SceneStatus::Rejected);

        let mut flagged = analysis(80);
        flagged.recommend_regeneration = true;
        assert_eq!(derive_status(&flagged, false), SceneStatus::Rejected);
    }

    #[test]
    fn test_mid_band_needs_review() {
        for score in 70..85 {
            assert_eq!(
                derive_status(&analysis(score), false),
                SceneStatus::NeedsReview,
                "score {score}"
            );
        }
    }

    #[test]
    fn test_from_analysis_sets_auto_approved() {
        let status = SceneQualityStatus::from_analysis(0, &analysis(90));
        assert!(status.auto_approved);
        assert!(!status.user_approved);
        assert_eq!(status.status, SceneStatus::Approved);
    }
}
