use std::collections::HashMap;

use cms_migrate_shared::types::{
    CommentRecord, CommentStatus, ContentRef, LegacyComment, LegacyId, TargetId,
};
use tracing::{debug, info, instrument, warn};

use crate::dates::normalize_timestamp;
use crate::errors::MigrationError;
use crate::hierarchy::ParentLinks;
use crate::meta::meta_entries;
use crate::migrators::relationships::resolve_object;
use crate::migrators::{MigrationContext, Migrator};
use crate::resolver::EntityFamily;
use crate::summary::{Phase, PhaseSummary};

/// Migrates comments. A comment whose post cannot be resolved is kept as an
/// orphan with no content reference; replies are wired in a second pass.
pub struct CommentsMigrator;

#[async_trait::async_trait]
impl Migrator for CommentsMigrator {
    fn phase(&self) -> Phase {
        Phase::Comments
    }

    #[instrument(skip_all, fields(phase = "comments"))]
    async fn migrate(&self, ctx: &mut MigrationContext<'_>) -> Result<PhaseSummary, MigrationError> {
        let mut summary = PhaseSummary::new(Phase::Comments);
        let mut targets: HashMap<LegacyId, Option<ContentRef>> = HashMap::new();
        let mut replies: Vec<(TargetId, LegacyId)> = Vec::new();

        for comment in ctx.legacy.find_comments().await? {
            let content = match targets.get(&comment.post_id) {
                Some(resolved) => *resolved,
                None => {
                    let resolved = resolve_object(ctx, comment.post_id).await?;
                    targets.insert(comment.post_id, resolved);
                    resolved
                }
            };
            if content.is_none() {
                debug!(legacy_id = comment.id, post_id = comment.post_id, "Comment target unresolved, keeping orphan");
            }

            let record = comment_record(ctx, &comment, content);
            let meta_rows = ctx.legacy.find_comment_meta(comment.id).await?;
            let meta = meta_entries(&meta_rows);

            match ctx.target.persist_comment(&record, &meta).await {
                Ok(id) => {
                    ctx.resolver.record(EntityFamily::Comments, comment.id, id);
                    if comment.parent_id != 0 {
                        replies.push((id, comment.parent_id));
                    }
                    summary.created();
                }
                Err(e) => {
                    warn!(legacy_id = comment.id, family = "comments", reason = %e, "Failed to migrate comment");
                    summary.fail();
                }
            }
        }

        link_replies(ctx, &replies).await;
        Ok(summary)
    }
}

fn comment_record(
    ctx: &MigrationContext<'_>,
    comment: &LegacyComment,
    content: Option<ContentRef>,
) -> CommentRecord {
    let user_id = match comment.user_id {
        0 => None,
        legacy_id => ctx.resolver.lookup(EntityFamily::Users, legacy_id),
    };

    CommentRecord {
        content,
        user_id,
        author_name: comment.author_name.trim().to_string(),
        author_email: comment.author_email.trim().to_string(),
        author_url: comment.author_url.trim().to_string(),
        body: comment.content.clone(),
        status: CommentStatus::from_legacy(&comment.approved),
        created_at: normalize_timestamp(comment.created_at.as_deref(), ctx.now),
    }
}

async fn link_replies(ctx: &MigrationContext<'_>, replies: &[(TargetId, LegacyId)]) {
    let mut links = ParentLinks::new();
    let mut linked = 0u64;

    for (comment_id, legacy_parent) in replies {
        let Some(parent_id) = ctx.resolver.lookup(EntityFamily::Comments, *legacy_parent) else {
            continue;
        };
        if !links.link(*comment_id, parent_id) {
            warn!(comment_id, parent_id, family = "comments", reason = "cycle", "Skipping reply link");
            continue;
        }
        match ctx.target.set_comment_parent(*comment_id, Some(parent_id)).await {
            Ok(()) => linked += 1,
            Err(e) => warn!(comment_id, parent_id, family = "comments", reason = %e, "Failed to link reply"),
        }
    }

    if linked > 0 {
        info!(linked, "Linked comment replies");
    }
}
