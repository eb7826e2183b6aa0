//! Annotation Store
//!
//! Sole reader/writer of Video, Move, and FrameTag state, backed by SQLite.
//! Every invariant on the records is enforced here, at the boundary of each
//! mutating operation; cascading deletes run inside a single transaction so
//! readers never observe a move without its tags or vice versa.

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::{debug, info};

use crate::core::{frame_to_ms, new_id, CoreError, CoreResult, Frame};

use super::{
    FrameTag, FrameTagDraft, LabelSchema, Move, MoveDraft, MoveUpdate, Video, VideoDraft,
    MAX_DESCRIPTION_LEN,
};

// =============================================================================
// Annotation Store
// =============================================================================

/// SQLite-backed store for annotation records.
pub struct AnnotationStore {
    conn: Connection,
    schema: LabelSchema,
}

impl AnnotationStore {
    /// Opens (or creates) a store at the given database path.
    pub fn open<P: AsRef<Path>>(path: P, schema: LabelSchema) -> CoreResult<Self> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        let store = Self { conn, schema };
        store.init_schema()?;
        Ok(store)
    }

    /// Creates an in-memory store (for testing).
    pub fn in_memory(schema: LabelSchema) -> CoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn, schema };
        store.init_schema()?;
        Ok(store)
    }

    /// Returns the label schema this store validates against.
    pub fn schema(&self) -> &LabelSchema {
        &self.schema
    }

    /// Initializes the database schema.
    fn init_schema(&self) -> CoreResult<()> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS videos (
                id TEXT PRIMARY KEY,
                filename TEXT NOT NULL,
                path TEXT NOT NULL,
                pose_csv_path TEXT NOT NULL,
                fps REAL NOT NULL,
                total_frames INTEGER NOT NULL,
                duration_ms REAL NOT NULL,
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS moves (
                id TEXT PRIMARY KEY,
                video_id TEXT NOT NULL REFERENCES videos(id),
                frame_start INTEGER NOT NULL,
                frame_end INTEGER NOT NULL,
                timestamp_start_ms REAL NOT NULL,
                timestamp_end_ms REAL NOT NULL,
                move_type TEXT NOT NULL,
                form_quality INTEGER NOT NULL,
                effort_level INTEGER NOT NULL,
                contextual_data TEXT NOT NULL,
                technique_modifiers TEXT NOT NULL DEFAULT '[]',
                tags TEXT NOT NULL,
                description TEXT NOT NULL,
                labeled_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS frame_tags (
                id TEXT PRIMARY KEY,
                move_id TEXT NOT NULL REFERENCES moves(id),
                frame_number INTEGER NOT NULL,
                timestamp_ms REAL NOT NULL,
                tag_type TEXT NOT NULL,
                level INTEGER,
                locations TEXT NOT NULL,
                note TEXT NOT NULL,
                tagged_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_moves_video ON moves(video_id);
            CREATE INDEX IF NOT EXISTS idx_frame_tags_move ON frame_tags(move_id);
            "#,
        )?;
        Ok(())
    }

    // =========================================================================
    // Video Operations
    // =========================================================================

    /// Registers a video after successful pose extraction.
    pub fn create_video(&self, draft: VideoDraft) -> CoreResult<Video> {
        if draft.fps <= 0.0 {
            return Err(CoreError::RangeInvalid(format!(
                "fps must be positive, got {}",
                draft.fps
            )));
        }
        if draft.total_frames < 0 {
            return Err(CoreError::RangeInvalid(format!(
                "total_frames must be non-negative, got {}",
                draft.total_frames
            )));
        }

        let video = draft.into_video();
        self.conn.execute(
            r#"
            INSERT INTO videos (id, filename, path, pose_csv_path, fps, total_frames, duration_ms, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
            params![
                video.id,
                video.filename,
                video.path,
                video.pose_csv_path,
                video.fps,
                video.total_frames,
                video.duration_ms,
                video.created_at,
            ],
        )?;

        info!(video_id = %video.id, filename = %video.filename, "Created video record");
        Ok(video)
    }

    /// Gets a video by id.
    pub fn get_video(&self, video_id: &str) -> CoreResult<Video> {
        self.conn
            .query_row(
                "SELECT id, filename, path, pose_csv_path, fps, total_frames, duration_ms, created_at
                 FROM videos WHERE id = ?1",
                [video_id],
                read_video_row,
            )
            .optional()?
            .ok_or_else(|| not_found("video", video_id))
    }

    /// Lists all videos, most recently created first.
    pub fn list_videos(&self) -> CoreResult<Vec<Video>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, filename, path, pose_csv_path, fps, total_frames, duration_ms, created_at
             FROM videos ORDER BY created_at DESC, id DESC",
        )?;
        let videos = stmt
            .query_map([], read_video_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(videos)
    }

    /// Deletes a video record together with all its moves and their frame
    /// tags, in one transaction.
    pub fn delete_video(&mut self, video_id: &str) -> CoreResult<()> {
        let tx = self.conn.transaction()?;

        let tags_deleted = tx.execute(
            "DELETE FROM frame_tags WHERE move_id IN (SELECT id FROM moves WHERE video_id = ?1)",
            [video_id],
        )?;
        let moves_deleted = tx.execute("DELETE FROM moves WHERE video_id = ?1", [video_id])?;
        let videos_deleted = tx.execute("DELETE FROM videos WHERE id = ?1", [video_id])?;

        if videos_deleted == 0 {
            return Err(not_found("video", video_id));
        }
        tx.commit()?;

        info!(video_id, moves_deleted, tags_deleted, "Deleted video with cascade");
        Ok(())
    }

    // =========================================================================
    // Move Operations
    // =========================================================================

    /// Creates a move from a confirmed frame-range selection.
    pub fn create_move(&self, draft: MoveDraft) -> CoreResult<Move> {
        let video = self.get_video(&draft.video_id)?;
        self.validate_move_fields(
            &video,
            draft.frame_start,
            draft.frame_end,
            &draft.move_type,
            draft.form_quality,
            draft.effort_level,
            &draft.contextual_data,
            &draft.description,
        )?;

        let mv = Move {
            id: new_id(),
            video_id: draft.video_id,
            frame_start: draft.frame_start,
            frame_end: draft.frame_end,
            timestamp_start_ms: frame_to_ms(draft.frame_start, video.fps),
            timestamp_end_ms: frame_to_ms(draft.frame_end, video.fps),
            move_type: draft.move_type,
            form_quality: draft.form_quality,
            effort_level: draft.effort_level,
            contextual_data: draft.contextual_data,
            technique_modifiers: draft.technique_modifiers,
            tags: draft.tags,
            description: draft.description,
            labeled_at: Utc::now(),
            frame_tag_count: 0,
        };

        self.conn.execute(
            r#"
            INSERT INTO moves (
                id, video_id, frame_start, frame_end, timestamp_start_ms, timestamp_end_ms,
                move_type, form_quality, effort_level, contextual_data, technique_modifiers,
                tags, description, labeled_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
            "#,
            params![
                mv.id,
                mv.video_id,
                mv.frame_start,
                mv.frame_end,
                mv.timestamp_start_ms,
                mv.timestamp_end_ms,
                mv.move_type,
                mv.form_quality,
                mv.effort_level,
                serde_json::to_string(&mv.contextual_data)?,
                serde_json::to_string(&mv.technique_modifiers)?,
                serde_json::to_string(&mv.tags)?,
                mv.description,
                mv.labeled_at,
            ],
        )?;

        info!(
            move_id = %mv.id,
            video_id = %mv.video_id,
            move_type = %mv.move_type,
            range = format!("{}~{}", mv.frame_start, mv.frame_end),
            "Created move"
        );
        Ok(mv)
    }

    /// Gets a move by id, including its derived frame tag count.
    pub fn get_move(&self, move_id: &str) -> CoreResult<Move> {
        let row = self
            .conn
            .query_row(
                &format!("{MOVE_SELECT} WHERE m.id = ?1"),
                [move_id],
                read_move_row,
            )
            .optional()?
            .ok_or_else(|| not_found("move", move_id))?;
        move_from_row(row)
    }

    /// Lists all moves for a video, ordered by `frame_start` ascending.
    pub fn list_moves(&self, video_id: &str) -> CoreResult<Vec<Move>> {
        let mut stmt = self.conn.prepare(&format!(
            "{MOVE_SELECT} WHERE m.video_id = ?1 ORDER BY m.frame_start ASC, m.id ASC"
        ))?;
        let rows = stmt
            .query_map([video_id], read_move_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        rows.into_iter().map(move_from_row).collect()
    }

    /// Applies a partial update to a move.
    ///
    /// Changed fields go through the same validation as creation. A changed
    /// frame range does not revalidate existing frame tags.
    pub fn update_move(&self, move_id: &str, update: MoveUpdate) -> CoreResult<Move> {
        let mut mv = self.get_move(move_id)?;
        let video = self.get_video(&mv.video_id)?;

        if let Some(frame_start) = update.frame_start {
            mv.frame_start = frame_start;
        }
        if let Some(frame_end) = update.frame_end {
            mv.frame_end = frame_end;
        }
        if let Some(move_type) = update.move_type {
            mv.move_type = move_type;
        }
        if let Some(form_quality) = update.form_quality {
            mv.form_quality = form_quality;
        }
        if let Some(effort_level) = update.effort_level {
            mv.effort_level = effort_level;
        }
        if let Some(contextual_data) = update.contextual_data {
            mv.contextual_data = contextual_data;
        }
        if let Some(technique_modifiers) = update.technique_modifiers {
            mv.technique_modifiers = technique_modifiers;
        }
        if let Some(tags) = update.tags {
            mv.tags = tags;
        }
        if let Some(description) = update.description {
            mv.description = description;
        }

        self.validate_move_fields(
            &video,
            mv.frame_start,
            mv.frame_end,
            &mv.move_type,
            mv.form_quality,
            mv.effort_level,
            &mv.contextual_data,
            &mv.description,
        )?;

        mv.timestamp_start_ms = frame_to_ms(mv.frame_start, video.fps);
        mv.timestamp_end_ms = frame_to_ms(mv.frame_end, video.fps);

        self.conn.execute(
            r#"
            UPDATE moves SET
                frame_start = ?1,
                frame_end = ?2,
                timestamp_start_ms = ?3,
                timestamp_end_ms = ?4,
                move_type = ?5,
                form_quality = ?6,
                effort_level = ?7,
                contextual_data = ?8,
                technique_modifiers = ?9,
                tags = ?10,
                description = ?11
            WHERE id = ?12
            "#,
            params![
                mv.frame_start,
                mv.frame_end,
                mv.timestamp_start_ms,
                mv.timestamp_end_ms,
                mv.move_type,
                mv.form_quality,
                mv.effort_level,
                serde_json::to_string(&mv.contextual_data)?,
                serde_json::to_string(&mv.technique_modifiers)?,
                serde_json::to_string(&mv.tags)?,
                mv.description,
                move_id,
            ],
        )?;

        debug!(move_id, "Updated move");
        Ok(mv)
    }

    /// Deletes a move and every frame tag it owns, in one transaction.
    pub fn delete_move(&mut self, move_id: &str) -> CoreResult<()> {
        let tx = self.conn.transaction()?;

        let tags_deleted = tx.execute("DELETE FROM frame_tags WHERE move_id = ?1", [move_id])?;
        let moves_deleted = tx.execute("DELETE FROM moves WHERE id = ?1", [move_id])?;

        if moves_deleted == 0 {
            return Err(not_found("move", move_id));
        }
        tx.commit()?;

        info!(move_id, tags_deleted, "Deleted move with cascade");
        Ok(())
    }

    /// Shared validation for move creation and update.
    #[allow(clippy::too_many_arguments)]
    fn validate_move_fields(
        &self,
        video: &Video,
        frame_start: Frame,
        frame_end: Frame,
        move_type: &str,
        form_quality: i64,
        effort_level: i64,
        contextual_data: &super::ContextualData,
        description: &str,
    ) -> CoreResult<()> {
        if frame_start >= frame_end {
            return Err(CoreError::RangeInvalid(format!(
                "frame_start {frame_start} must be less than frame_end {frame_end}"
            )));
        }
        if frame_start < 0 || frame_end > video.total_frames {
            return Err(CoreError::RangeInvalid(format!(
                "frame range {frame_start}~{frame_end} outside video bounds 0~{}",
                video.total_frames
            )));
        }
        if !(1..=5).contains(&form_quality) {
            return Err(CoreError::RangeInvalid(format!(
                "form_quality must be 1-5, got {form_quality}"
            )));
        }
        if !(0..=10).contains(&effort_level) {
            return Err(CoreError::RangeInvalid(format!(
                "effort_level must be 0-10, got {effort_level}"
            )));
        }
        if description.len() > MAX_DESCRIPTION_LEN {
            return Err(CoreError::RangeInvalid(format!(
                "description exceeds {MAX_DESCRIPTION_LEN} characters"
            )));
        }
        self.schema.validate_contextual(move_type, contextual_data)
    }

    // =========================================================================
    // Frame Tag Operations
    // =========================================================================

    /// Creates a frame tag on a frame within the owning move's current range.
    pub fn create_frame_tag(&self, draft: FrameTagDraft) -> CoreResult<FrameTag> {
        let mv = self.get_move(&draft.move_id)?;
        let video = self.get_video(&mv.video_id)?;

        if !mv.contains_frame(draft.frame_number) {
            return Err(CoreError::FrameOutOfRange {
                frame: draft.frame_number,
                start: mv.frame_start,
                end: mv.frame_end,
            });
        }
        self.schema.require_tag_type(&draft.tag_type)?;
        self.schema.validate_locations(&draft.locations)?;
        if let Some(level) = draft.level {
            if !(0..=10).contains(&level) {
                return Err(CoreError::RangeInvalid(format!(
                    "tag level must be 0-10, got {level}"
                )));
            }
        }

        let tag = FrameTag {
            id: new_id(),
            move_id: draft.move_id,
            frame_number: draft.frame_number,
            timestamp_ms: frame_to_ms(draft.frame_number, video.fps),
            tag_type: draft.tag_type,
            level: draft.level,
            locations: draft.locations,
            note: draft.note,
            tagged_at: Utc::now(),
        };

        self.conn.execute(
            r#"
            INSERT INTO frame_tags (id, move_id, frame_number, timestamp_ms, tag_type, level, locations, note, tagged_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
            params![
                tag.id,
                tag.move_id,
                tag.frame_number,
                tag.timestamp_ms,
                tag.tag_type,
                tag.level,
                serde_json::to_string(&tag.locations)?,
                tag.note,
                tag.tagged_at,
            ],
        )?;

        info!(
            tag_id = %tag.id,
            move_id = %tag.move_id,
            frame = tag.frame_number,
            tag_type = %tag.tag_type,
            "Created frame tag"
        );
        Ok(tag)
    }

    /// Gets a frame tag by id.
    pub fn get_frame_tag(&self, tag_id: &str) -> CoreResult<FrameTag> {
        let row = self
            .conn
            .query_row(
                "SELECT id, move_id, frame_number, timestamp_ms, tag_type, level, locations, note, tagged_at
                 FROM frame_tags WHERE id = ?1",
                [tag_id],
                read_frame_tag_row,
            )
            .optional()?
            .ok_or_else(|| not_found("frame tag", tag_id))?;
        frame_tag_from_row(row)
    }

    /// Lists all frame tags for a move, ordered by frame number ascending.
    ///
    /// A move id with no tags (including an already-deleted move) yields an
    /// empty list, not an error.
    pub fn list_frame_tags(&self, move_id: &str) -> CoreResult<Vec<FrameTag>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, move_id, frame_number, timestamp_ms, tag_type, level, locations, note, tagged_at
             FROM frame_tags WHERE move_id = ?1
             ORDER BY frame_number ASC, tagged_at ASC, id ASC",
        )?;
        let rows = stmt
            .query_map([move_id], read_frame_tag_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        rows.into_iter().map(frame_tag_from_row).collect()
    }

    /// Deletes a frame tag.
    pub fn delete_frame_tag(&self, tag_id: &str) -> CoreResult<()> {
        let deleted = self
            .conn
            .execute("DELETE FROM frame_tags WHERE id = ?1", [tag_id])?;
        if deleted == 0 {
            return Err(not_found("frame tag", tag_id));
        }
        info!(tag_id, "Deleted frame tag");
        Ok(())
    }
}

// =============================================================================
// Row Mapping
// =============================================================================

const MOVE_SELECT: &str = r#"
    SELECT m.id, m.video_id, m.frame_start, m.frame_end,
           m.timestamp_start_ms, m.timestamp_end_ms,
           m.move_type, m.form_quality, m.effort_level,
           m.contextual_data, m.technique_modifiers, m.tags, m.description,
           m.labeled_at,
           (SELECT COUNT(*) FROM frame_tags t WHERE t.move_id = m.id) AS frame_tag_count
    FROM moves m
"#;

fn not_found(entity: &str, id: &str) -> CoreError {
    CoreError::NotFound(format!("{entity} {id}"))
}

fn read_video_row(row: &Row<'_>) -> rusqlite::Result<Video> {
    Ok(Video {
        id: row.get(0)?,
        filename: row.get(1)?,
        path: row.get(2)?,
        pose_csv_path: row.get(3)?,
        fps: row.get(4)?,
        total_frames: row.get(5)?,
        duration_ms: row.get(6)?,
        created_at: row.get::<_, DateTime<Utc>>(7)?,
    })
}

/// Move row with JSON columns still serialized; decoded by `move_from_row`.
struct MoveRow {
    id: String,
    video_id: String,
    frame_start: Frame,
    frame_end: Frame,
    timestamp_start_ms: f64,
    timestamp_end_ms: f64,
    move_type: String,
    form_quality: i64,
    effort_level: i64,
    contextual_data: String,
    technique_modifiers: String,
    tags: String,
    description: String,
    labeled_at: DateTime<Utc>,
    frame_tag_count: i64,
}

fn read_move_row(row: &Row<'_>) -> rusqlite::Result<MoveRow> {
    Ok(MoveRow {
        id: row.get(0)?,
        video_id: row.get(1)?,
        frame_start: row.get(2)?,
        frame_end: row.get(3)?,
        timestamp_start_ms: row.get(4)?,
        timestamp_end_ms: row.get(5)?,
        move_type: row.get(6)?,
        form_quality: row.get(7)?,
        effort_level: row.get(8)?,
        contextual_data: row.get(9)?,
        technique_modifiers: row.get(10)?,
        tags: row.get(11)?,
        description: row.get(12)?,
        labeled_at: row.get(13)?,
        frame_tag_count: row.get(14)?,
    })
}

fn move_from_row(row: MoveRow) -> CoreResult<Move> {
    Ok(Move {
        id: row.id,
        video_id: row.video_id,
        frame_start: row.frame_start,
        frame_end: row.frame_end,
        timestamp_start_ms: row.timestamp_start_ms,
        timestamp_end_ms: row.timestamp_end_ms,
        move_type: row.move_type,
        form_quality: row.form_quality,
        effort_level: row.effort_level,
        contextual_data: serde_json::from_str(&row.contextual_data)?,
        technique_modifiers: serde_json::from_str(&row.technique_modifiers)?,
        tags: serde_json::from_str(&row.tags)?,
        description: row.description,
        labeled_at: row.labeled_at,
        frame_tag_count: row.frame_tag_count,
    })
}

struct FrameTagRow {
    id: String,
    move_id: String,
    frame_number: Frame,
    timestamp_ms: f64,
    tag_type: String,
    level: Option<i64>,
    locations: String,
    note: String,
    tagged_at: DateTime<Utc>,
}

fn read_frame_tag_row(row: &Row<'_>) -> rusqlite::Result<FrameTagRow> {
    Ok(FrameTagRow {
        id: row.get(0)?,
        move_id: row.get(1)?,
        frame_number: row.get(2)?,
        timestamp_ms: row.get(3)?,
        tag_type: row.get(4)?,
        level: row.get(5)?,
        locations: row.get(6)?,
        note: row.get(7)?,
        tagged_at: row.get(8)?,
    })
}

fn frame_tag_from_row(row: FrameTagRow) -> CoreResult<FrameTag> {
    Ok(FrameTag {
        id: row.id,
        move_id: row.move_id,
        frame_number: row.frame_number,
        timestamp_ms: row.timestamp_ms,
        tag_type: row.tag_type,
        level: row.level,
        locations: serde_json::from_str(&row.locations)?,
        note: row.note,
        tagged_at: row.tagged_at,
    })
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::annotations::ContextualAnswer;

    fn test_store() -> AnnotationStore {
        AnnotationStore::in_memory(LabelSchema::builtin()).unwrap()
    }

    fn sample_video(store: &AnnotationStore) -> Video {
        store
            .create_video(VideoDraft {
                filename: "send.mp4".into(),
                path: "/videos/send.mp4".into(),
                pose_csv_path: "/data/send.csv".into(),
                fps: 10.0,
                total_frames: 100,
            })
            .unwrap()
    }

    fn sample_move_draft(video_id: &str) -> MoveDraft {
        MoveDraft {
            video_id: video_id.to_string(),
            frame_start: 10,
            frame_end: 30,
            move_type: "static".into(),
            form_quality: 3,
            effort_level: 5,
            ..Default::default()
        }
    }

    fn sample_tag_draft(move_id: &str, frame: Frame) -> FrameTagDraft {
        FrameTagDraft {
            move_id: move_id.to_string(),
            frame_number: frame,
            tag_type: "weak".into(),
            level: Some(4),
            locations: vec!["left_knee".into()],
            note: String::new(),
        }
    }

    // -------------------------------------------------------------------------
    // Videos
    // -------------------------------------------------------------------------

    #[test]
    fn test_create_and_get_video() {
        let store = test_store();
        let video = sample_video(&store);

        let loaded = store.get_video(&video.id).unwrap();
        assert_eq!(loaded, video);
        assert_eq!(loaded.duration_ms, 10_000.0);
    }

    #[test]
    fn test_create_video_rejects_bad_metadata() {
        let store = test_store();

        let err = store
            .create_video(VideoDraft {
                filename: "a.mp4".into(),
                path: "/a.mp4".into(),
                pose_csv_path: "/a.csv".into(),
                fps: 0.0,
                total_frames: 10,
            })
            .unwrap_err();
        assert!(matches!(err, CoreError::RangeInvalid(_)));

        let err = store
            .create_video(VideoDraft {
                filename: "a.mp4".into(),
                path: "/a.mp4".into(),
                pose_csv_path: "/a.csv".into(),
                fps: 30.0,
                total_frames: -1,
            })
            .unwrap_err();
        assert!(matches!(err, CoreError::RangeInvalid(_)));
    }

    #[test]
    fn test_get_video_not_found() {
        let store = test_store();
        assert!(matches!(
            store.get_video("missing").unwrap_err(),
            CoreError::NotFound(_)
        ));
    }

    #[test]
    fn test_list_videos() {
        let store = test_store();
        sample_video(&store);
        sample_video(&store);
        assert_eq!(store.list_videos().unwrap().len(), 2);
    }

    #[test]
    fn test_delete_video_cascades() {
        let mut store = test_store();
        let video = sample_video(&store);
        let mv = store.create_move(sample_move_draft(&video.id)).unwrap();
        let tag = store.create_frame_tag(sample_tag_draft(&mv.id, 15)).unwrap();

        store.delete_video(&video.id).unwrap();

        assert!(matches!(store.get_video(&video.id).unwrap_err(), CoreError::NotFound(_)));
        assert!(matches!(store.get_move(&mv.id).unwrap_err(), CoreError::NotFound(_)));
        assert!(matches!(store.get_frame_tag(&tag.id).unwrap_err(), CoreError::NotFound(_)));
    }

    // -------------------------------------------------------------------------
    // Moves: creation and validation
    // -------------------------------------------------------------------------

    #[test]
    fn test_create_move_computes_derived_fields() {
        let store = test_store();
        let video = sample_video(&store);
        let mv = store.create_move(sample_move_draft(&video.id)).unwrap();

        assert_eq!(mv.timestamp_start_ms, 1000.0);
        assert_eq!(mv.timestamp_end_ms, 3000.0);
        assert_eq!(mv.frame_tag_count, 0);

        let loaded = store.get_move(&mv.id).unwrap();
        assert_eq!(loaded, mv);
    }

    #[test]
    fn test_create_move_unknown_video() {
        let store = test_store();
        let err = store.create_move(sample_move_draft("missing")).unwrap_err();
        assert!(matches!(err, CoreError::NotFound(_)));
    }

    #[test]
    fn test_create_move_empty_range_rejected() {
        let store = test_store();
        let video = sample_video(&store);
        let mut draft = sample_move_draft(&video.id);
        draft.frame_start = 5;
        draft.frame_end = 5;

        let err = store.create_move(draft).unwrap_err();
        assert!(matches!(err, CoreError::RangeInvalid(_)));
    }

    #[test]
    fn test_create_move_out_of_bounds_rejected() {
        let store = test_store();
        let video = sample_video(&store);

        let mut draft = sample_move_draft(&video.id);
        draft.frame_start = -1;
        assert!(matches!(
            store.create_move(draft).unwrap_err(),
            CoreError::RangeInvalid(_)
        ));

        let mut draft = sample_move_draft(&video.id);
        draft.frame_end = 101;
        assert!(matches!(
            store.create_move(draft).unwrap_err(),
            CoreError::RangeInvalid(_)
        ));
    }

    #[test]
    fn test_create_move_rating_bounds() {
        let store = test_store();
        let video = sample_video(&store);

        let mut draft = sample_move_draft(&video.id);
        draft.form_quality = 6;
        assert!(matches!(
            store.create_move(draft).unwrap_err(),
            CoreError::RangeInvalid(_)
        ));

        let mut draft = sample_move_draft(&video.id);
        draft.effort_level = 11;
        assert!(matches!(
            store.create_move(draft).unwrap_err(),
            CoreError::RangeInvalid(_)
        ));
    }

    #[test]
    fn test_create_move_unknown_type_and_schema_mismatch() {
        let store = test_store();
        let video = sample_video(&store);

        let mut draft = sample_move_draft(&video.id);
        draft.move_type = "campus".into();
        assert!(matches!(
            store.create_move(draft).unwrap_err(),
            CoreError::UnknownMoveType(_)
        ));

        let mut draft = sample_move_draft(&video.id);
        draft.contextual_data.insert(
            "catching_hand".into(),
            ContextualAnswer::One("right_hand".into()),
        );
        // "catching_hand" belongs to dyno, not static
        assert!(matches!(
            store.create_move(draft).unwrap_err(),
            CoreError::SchemaMismatch { .. }
        ));
    }

    // -------------------------------------------------------------------------
    // Moves: update and delete
    // -------------------------------------------------------------------------

    #[test]
    fn test_update_move_revalidates_and_recomputes() {
        let store = test_store();
        let video = sample_video(&store);
        let mv = store.create_move(sample_move_draft(&video.id)).unwrap();

        let updated = store
            .update_move(
                &mv.id,
                MoveUpdate {
                    frame_end: Some(50),
                    form_quality: Some(4),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(updated.frame_end, 50);
        assert_eq!(updated.timestamp_end_ms, 5000.0);
        assert_eq!(updated.form_quality, 4);

        let err = store
            .update_move(
                &mv.id,
                MoveUpdate {
                    frame_end: Some(9), // below frame_start 10
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert!(matches!(err, CoreError::RangeInvalid(_)));

        // Changing type invalidates answers from the old type's schema
        let with_answers = store
            .update_move(
                &mv.id,
                MoveUpdate {
                    contextual_data: Some(
                        [(
                            "reaching_hand".to_string(),
                            ContextualAnswer::One("left_hand".into()),
                        )]
                        .into_iter()
                        .collect(),
                    ),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(with_answers.contextual_data.len(), 1);

        let err = store
            .update_move(
                &mv.id,
                MoveUpdate {
                    move_type: Some("mantle".into()),
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert!(matches!(err, CoreError::SchemaMismatch { .. }));
    }

    #[test]
    fn test_update_move_does_not_revalidate_existing_tags() {
        let store = test_store();
        let video = sample_video(&store);
        let mv = store.create_move(sample_move_draft(&video.id)).unwrap();
        store.create_frame_tag(sample_tag_draft(&mv.id, 28)).unwrap();

        // Shrink the range so frame 28 falls outside it
        store
            .update_move(
                &mv.id,
                MoveUpdate {
                    frame_end: Some(20),
                    ..Default::default()
                },
            )
            .unwrap();

        let tags = store.list_frame_tags(&mv.id).unwrap();
        assert_eq!(tags.len(), 1);
        assert_eq!(tags[0].frame_number, 28);
    }

    #[test]
    fn test_delete_move_cascades_atomically() {
        let mut store = test_store();
        let video = sample_video(&store);
        let mv = store.create_move(sample_move_draft(&video.id)).unwrap();
        let t1 = store.create_frame_tag(sample_tag_draft(&mv.id, 12)).unwrap();
        let t2 = store.create_frame_tag(sample_tag_draft(&mv.id, 20)).unwrap();

        store.delete_move(&mv.id).unwrap();

        assert!(matches!(store.get_move(&mv.id).unwrap_err(), CoreError::NotFound(_)));
        assert!(store.list_frame_tags(&mv.id).unwrap().is_empty());
        assert!(matches!(store.get_frame_tag(&t1.id).unwrap_err(), CoreError::NotFound(_)));
        assert!(matches!(store.get_frame_tag(&t2.id).unwrap_err(), CoreError::NotFound(_)));
    }

    #[test]
    fn test_delete_move_not_found() {
        let mut store = test_store();
        assert!(matches!(
            store.delete_move("missing").unwrap_err(),
            CoreError::NotFound(_)
        ));
    }

    #[test]
    fn test_list_moves_ordered_by_frame_start() {
        let store = test_store();
        let video = sample_video(&store);

        let mut late = sample_move_draft(&video.id);
        late.frame_start = 60;
        late.frame_end = 80;
        store.create_move(late).unwrap();

        let early = sample_move_draft(&video.id);
        store.create_move(early).unwrap();

        let moves = store.list_moves(&video.id).unwrap();
        assert_eq!(moves.len(), 2);
        assert_eq!(moves[0].frame_start, 10);
        assert_eq!(moves[1].frame_start, 60);
    }

    #[test]
    fn test_list_moves_empty_is_ok() {
        let store = test_store();
        let video = sample_video(&store);
        assert!(store.list_moves(&video.id).unwrap().is_empty());
    }

    // -------------------------------------------------------------------------
    // Frame Tags
    // -------------------------------------------------------------------------

    #[test]
    fn test_create_frame_tag_within_range() {
        let store = test_store();
        let video = sample_video(&store);
        let mv = store.create_move(sample_move_draft(&video.id)).unwrap();

        // Boundary frames are inside the range
        store.create_frame_tag(sample_tag_draft(&mv.id, 10)).unwrap();
        let tag = store.create_frame_tag(sample_tag_draft(&mv.id, 30)).unwrap();
        assert_eq!(tag.timestamp_ms, 3000.0);

        assert_eq!(store.get_move(&mv.id).unwrap().frame_tag_count, 2);
    }

    #[test]
    fn test_create_frame_tag_out_of_range() {
        let store = test_store();
        let video = sample_video(&store);
        let mv = store.create_move(sample_move_draft(&video.id)).unwrap();

        let err = store.create_frame_tag(sample_tag_draft(&mv.id, 31)).unwrap_err();
        assert!(matches!(err, CoreError::FrameOutOfRange { frame: 31, .. }));
    }

    #[test]
    fn test_create_frame_tag_vocabulary_violations() {
        let store = test_store();
        let video = sample_video(&store);
        let mv = store.create_move(sample_move_draft(&video.id)).unwrap();

        let mut draft = sample_tag_draft(&mv.id, 15);
        draft.tag_type = "tingly".into();
        assert!(matches!(
            store.create_frame_tag(draft).unwrap_err(),
            CoreError::UnknownTagType(_)
        ));

        let mut draft = sample_tag_draft(&mv.id, 15);
        draft.locations = vec![];
        assert!(matches!(
            store.create_frame_tag(draft).unwrap_err(),
            CoreError::EmptyLocations
        ));

        let mut draft = sample_tag_draft(&mv.id, 15);
        draft.locations = vec!["left_pinky".into()];
        assert!(matches!(
            store.create_frame_tag(draft).unwrap_err(),
            CoreError::UnknownLocation(_)
        ));

        let mut draft = sample_tag_draft(&mv.id, 15);
        draft.level = Some(11);
        assert!(matches!(
            store.create_frame_tag(draft).unwrap_err(),
            CoreError::RangeInvalid(_)
        ));
    }

    #[test]
    fn test_create_frame_tag_unknown_move() {
        let store = test_store();
        assert!(matches!(
            store.create_frame_tag(sample_tag_draft("missing", 5)).unwrap_err(),
            CoreError::NotFound(_)
        ));
    }

    #[test]
    fn test_delete_frame_tag() {
        let store = test_store();
        let video = sample_video(&store);
        let mv = store.create_move(sample_move_draft(&video.id)).unwrap();
        let tag = store.create_frame_tag(sample_tag_draft(&mv.id, 15)).unwrap();

        store.delete_frame_tag(&tag.id).unwrap();
        assert!(matches!(
            store.delete_frame_tag(&tag.id).unwrap_err(),
            CoreError::NotFound(_)
        ));
    }

    #[test]
    fn test_list_frame_tags_ordered() {
        let store = test_store();
        let video = sample_video(&store);
        let mv = store.create_move(sample_move_draft(&video.id)).unwrap();

        store.create_frame_tag(sample_tag_draft(&mv.id, 25)).unwrap();
        store.create_frame_tag(sample_tag_draft(&mv.id, 12)).unwrap();

        let tags = store.list_frame_tags(&mv.id).unwrap();
        assert_eq!(
            tags.iter().map(|t| t.frame_number).collect::<Vec<_>>(),
            vec![12, 25]
        );
    }

    #[test]
    fn test_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("labels.db");

        let video_id = {
            let store = AnnotationStore::open(&db_path, LabelSchema::builtin()).unwrap();
            sample_video(&store).id
        };

        let store = AnnotationStore::open(&db_path, LabelSchema::builtin()).unwrap();
        assert!(store.get_video(&video_id).is_ok());
    }
}
