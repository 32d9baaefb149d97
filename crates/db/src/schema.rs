use eyre::Result;
use sqlx::{Pool, Postgres};
use tracing::info;

/// Channel the `sessions` trigger publishes row changes on.
pub const SESSION_CHANGES_CHANNEL: &str = "session_changes";

pub async fn initialize_database(pool: &Pool<Postgres>) -> Result<()> {
    info!("Initializing database schema...");

    // Create profiles table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS profiles (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            full_name VARCHAR(255) NOT NULL,
            role VARCHAR(16) NOT NULL,
            created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW(),
            CONSTRAINT valid_role CHECK (role IN ('student', 'tutor'))
        );
        "#,
    )
    .execute(pool)
    .await?;

    // Create sessions table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS sessions (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            student_id UUID NOT NULL REFERENCES profiles(id),
            tutor_id UUID NOT NULL REFERENCES profiles(id),
            subject VARCHAR(255) NOT NULL,
            start_time TIMESTAMP WITH TIME ZONE NOT NULL,
            end_time TIMESTAMP WITH TIME ZONE NOT NULL,
            status VARCHAR(32) NOT NULL DEFAULT 'pending',
            notes TEXT NULL,
            cancellation_reason TEXT NULL,
            room_id VARCHAR(255) NULL,
            original_start_time TIMESTAMP WITH TIME ZONE NULL,
            original_end_time TIMESTAMP WITH TIME ZONE NULL,
            original_status VARCHAR(32) NULL,
            proposed_by UUID NULL REFERENCES profiles(id),
            version BIGINT NOT NULL DEFAULT 1,
            created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW(),
            updated_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW(),
            CONSTRAINT valid_time_range CHECK (end_time > start_time),
            CONSTRAINT distinct_parties CHECK (student_id <> tutor_id),
            CONSTRAINT valid_status CHECK (
                status IN ('pending', 'confirmed', 'reschedule_requested', 'cancelled', 'completed')
            )
        );
        "#,
    )
    .execute(pool)
    .await?;

    // Create notifications table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS notifications (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            recipient_id UUID NOT NULL REFERENCES profiles(id),
            sender_id UUID NOT NULL REFERENCES profiles(id),
            content TEXT NOT NULL,
            type VARCHAR(32) NOT NULL,
            link VARCHAR(255) NULL,
            is_read BOOLEAN NOT NULL DEFAULT FALSE,
            created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW()
        );
        "#,
    )
    .execute(pool)
    .await?;

    // Create indexes
    for statement in [
        "CREATE INDEX IF NOT EXISTS idx_sessions_student_id ON sessions(student_id)",
        "CREATE INDEX IF NOT EXISTS idx_sessions_tutor_id ON sessions(tutor_id)",
        "CREATE INDEX IF NOT EXISTS idx_sessions_start_time ON sessions(start_time)",
        "CREATE INDEX IF NOT EXISTS idx_notifications_recipient_id ON notifications(recipient_id, is_read)",
    ] {
        sqlx::query(statement).execute(pool).await?;
    }

    // Publish every row change of sessions to listeners. Free-text columns
    // are left out: pg_notify payloads must stay under 8000 bytes.
    sqlx::query(
        r#"
        CREATE OR REPLACE FUNCTION sessions_notify_change() RETURNS trigger AS $$
        BEGIN
            PERFORM pg_notify(
                'session_changes',
                json_build_object(
                    'eventType', lower(TG_OP),
                    'new', CASE WHEN TG_OP = 'DELETE' THEN NULL
                           ELSE to_jsonb(NEW) - 'notes' - 'cancellation_reason' END,
                    'old', CASE WHEN TG_OP = 'INSERT' THEN NULL
                           ELSE to_jsonb(OLD) - 'notes' - 'cancellation_reason' END
                )::text
            );
            RETURN COALESCE(NEW, OLD);
        END;
        $$ LANGUAGE plpgsql;
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("DROP TRIGGER IF EXISTS sessions_notify_change ON sessions")
        .execute(pool)
        .await?;

    sqlx::query(
        r#"
        CREATE TRIGGER sessions_notify_change
            AFTER INSERT OR UPDATE OR DELETE ON sessions
            FOR EACH ROW EXECUTE FUNCTION sessions_notify_change()
        "#,
    )
    .execute(pool)
    .await?;

    info!("Database schema initialized successfully.");
    Ok(())
}
