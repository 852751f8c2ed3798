//! Prompt context assembly.
//!
//! Builds the single bounded prompt string handed to the completion client:
//!
//! 1. run the flat knowledge search once across all sections
//! 2. apply the trigger-rule table and force-load fired sections in full
//! 3. cap the flat-search excerpts
//! 4. render in fixed order: instruction preamble, profile facts, triggered
//!    section dumps, search excerpts, conversation history (oldest first),
//!    the literal current question, a closing instruction
//!
//! Assembly never fails: an unloadable section is omitted and an empty
//! knowledge block is valid (the preamble tells the model to say when it
//! lacks information). Identical inputs produce identical output.
//!
//! Budget enforcement drops oldest conversation turns first, then search
//! excerpts, then triggered-section dumps. Profile facts and the current
//! question are never dropped.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, warn};
use zhiyuan_core::chat::{ConversationTurn, Profile, Role};
use zhiyuan_knowledge::{KnowledgeStore, SearchHit};

use crate::rules::fired_rules;
use crate::token::estimate_tokens;

/// Prompt assembly limits.
#[derive(Debug, Clone)]
pub struct PromptBudget {
    /// Total prompt budget in estimated tokens.
    pub max_tokens: usize,
    /// Cap on flat-search excerpts.
    pub max_search_hits: usize,
    /// Cap on conversation turns considered, before token trimming.
    pub max_history_turns: usize,
}

impl Default for PromptBudget {
    fn default() -> Self {
        Self {
            max_tokens: 12_000,
            max_search_hits: 5,
            max_history_turns: 20,
        }
    }
}

/// The rendered prompt plus assembly statistics. Immutable once built.
#[derive(Debug, Clone)]
pub struct PromptContext {
    pub text: String,
    pub stats: AssemblyStats,
}

/// What went into (and what was trimmed from) one assembled prompt.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AssemblyStats {
    /// Flat-search excerpts included.
    pub search_hits: usize,
    /// Excerpts dropped by the cap or the token budget.
    pub hits_dropped: usize,
    /// Ids of triggered sections whose dumps were included.
    pub triggered_sections: Vec<String>,
    /// Triggered sections dropped (unloadable or over budget).
    pub sections_dropped: usize,
    /// Conversation turns included.
    pub turns_included: usize,
    /// Conversation turns dropped (oldest first).
    pub turns_dropped: usize,
    /// Estimated token count of the final prompt.
    pub estimated_tokens: usize,
}

/// Builds one `PromptContext` per request. Stateless apart from the shared
/// knowledge store; create once and reuse.
pub struct ContextAssembler {
    store: Arc<KnowledgeStore>,
    budget: PromptBudget,
}

impl ContextAssembler {
    pub fn new(store: Arc<KnowledgeStore>, budget: PromptBudget) -> Self {
        Self { store, budget }
    }

    /// Assemble the prompt for one request.
    pub async fn build_context(
        &self,
        question: &str,
        profile: &Profile,
        history: &[ConversationTurn],
    ) -> PromptContext {
        let mut stats = AssemblyStats::default();

        // Step 1: flat retrieval across all sections, capped.
        let mut hits = self.store.search(question, None).await;
        if hits.len() > self.budget.max_search_hits {
            stats.hits_dropped = hits.len() - self.budget.max_search_hits;
            hits.truncate(self.budget.max_search_hits);
        }

        // Step 2: trigger rules force-load whole sections.
        let mut dumps: Vec<(&'static str, String, String)> = Vec::new();
        for rule in fired_rules(question, profile.province.as_deref()) {
            match self.store.load_section(rule.section_id).await {
                Ok(section) => {
                    let body = serde_json::to_string_pretty(&*section).unwrap_or_default();
                    dumps.push((rule.section_id, rule.label.to_string(), body));
                }
                Err(e) => {
                    stats.sections_dropped += 1;
                    warn!(section = rule.section_id, error = %e, "Triggered section unavailable, omitting block");
                }
            }
        }

        // Fixed parts, never dropped.
        let preamble = "基于以下知识库信息和对话历史回答用户问题：\n\n";
        let profile_block = render_profile(profile);
        let question_block = format!("\n当前用户问题：{question}\n\n");
        let closing = "请基于上述知识库信息，提供准确、详细且有帮助的回答。如果知识库中没有相关信息，请明确告知用户。";

        let fixed_tokens = estimate_tokens(preamble)
            + estimate_tokens(&profile_block)
            + estimate_tokens(&question_block)
            + estimate_tokens(closing);
        let mut remaining = self.budget.max_tokens.saturating_sub(fixed_tokens);

        // Budget allocation in keep-priority order: section dumps, then
        // search excerpts, then history. (Drop order is the reverse.)
        let mut dump_blocks: Vec<String> = Vec::new();
        for (id, label, body) in dumps {
            let block = format!("\n{label}：\n{body}\n");
            let cost = estimate_tokens(&block);
            if cost <= remaining {
                remaining -= cost;
                dump_blocks.push(block);
                stats.triggered_sections.push(id.to_string());
            } else {
                stats.sections_dropped += 1;
                debug!(section = id, "Section dump over budget, dropping");
            }
        }

        let mut excerpt_block = String::new();
        if !hits.is_empty() {
            let mut kept: Vec<&SearchHit> = Vec::new();
            let mut used = estimate_tokens("搜索结果：\n\n");
            for hit in &hits {
                let line = serde_json::to_string_pretty(hit).unwrap_or_default();
                let cost = estimate_tokens(&line);
                if used + cost <= remaining {
                    used += cost;
                    kept.push(hit);
                } else {
                    stats.hits_dropped += 1;
                }
            }
            if !kept.is_empty() {
                let body = serde_json::to_string_pretty(&kept).unwrap_or_default();
                excerpt_block = format!("搜索结果：\n{body}\n\n");
                // Recompute with the real rendering; the per-line estimate
                // above only guides the keep/drop decision.
                remaining = remaining.saturating_sub(estimate_tokens(&excerpt_block));
                stats.search_hits = kept.len();
            }
        }

        // History: newest turns kept, oldest dropped first.
        let considered: &[ConversationTurn] = if history.len() > self.budget.max_history_turns {
            &history[history.len() - self.budget.max_history_turns..]
        } else {
            history
        };
        stats.turns_dropped = history.len() - considered.len();

        let mut kept_lines: Vec<String> = Vec::new();
        let mut used = estimate_tokens("\n对话历史：\n");
        for turn in considered.iter().rev() {
            let speaker = match turn.role {
                Role::User => "用户",
                Role::Assistant => "助手",
            };
            let line = format!("{speaker}：{}\n", turn.content);
            let cost = estimate_tokens(&line);
            if used + cost <= remaining {
                used += cost;
                kept_lines.push(line);
            } else {
                stats.turns_dropped += 1;
            }
        }
        kept_lines.reverse();
        stats.turns_included = kept_lines.len();

        let history_block = if kept_lines.is_empty() {
            String::new()
        } else {
            format!("\n对话历史：\n{}", kept_lines.join(""))
        };

        // Final render in the fixed order.
        let mut text = String::new();
        text.push_str(preamble);
        text.push_str(&profile_block);
        for block in &dump_blocks {
            text.push_str(block);
        }
        text.push_str(&excerpt_block);
        text.push_str(&history_block);
        text.push_str(&question_block);
        text.push_str(closing);

        stats.estimated_tokens = estimate_tokens(&text);
        debug!(
            tokens = stats.estimated_tokens,
            hits = stats.search_hits,
            sections = stats.triggered_sections.len(),
            turns = stats.turns_included,
            "Assembled prompt context"
        );

        PromptContext { text, stats }
    }
}

fn render_profile(profile: &Profile) -> String {
    let mut lines = Vec::new();
    if let Some(province) = &profile.province {
        lines.push(format!("省份：{province}"));
    }
    if let Some(subject) = &profile.subject {
        lines.push(format!("科类：{subject}"));
    }
    if let Some(score) = profile.score {
        lines.push(format!("分数：{score}"));
    }
    if !profile.interests.is_empty() {
        lines.push(format!("兴趣方向：{}", profile.interests.join("、")));
    }
    if lines.is_empty() {
        String::new()
    } else {
        format!("考生信息：\n{}\n", lines.join("\n"))
    }
}
