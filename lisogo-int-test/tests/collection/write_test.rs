use lisogo::doc;
use lisogo::document::DocumentId;
use lisogo::entity::EntityRef;
use lisogo::errors::ErrorKind;
use lisogo_int_test::models::Note;
use lisogo_int_test::test_util::{cleanup, create_test_context, insert_test_notes, run_test};

#[test]
fn test_insert_and_count() {
    run_test(
        || create_test_context(),
        |ctx| {
            let db = ctx.db();
            insert_test_notes(&db, 5)?;
            let notes = db.collection("notes")?;
            assert_eq!(notes.count(&doc! {})?, 5);
            assert!(db.has_collection("notes")?);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_insert_duplicate_fails() {
    run_test(
        || create_test_context(),
        |ctx| {
            let notes = ctx.db().collection("notes")?;
            let note = EntityRef::new(Note::generate());
            notes.insert(&note)?;

            let err = notes.insert(&note).err().unwrap();
            assert_eq!(err.kind(), &ErrorKind::DuplicateKey);
            assert_eq!(notes.count(&doc! {})?, 1);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_insert_many() {
    run_test(
        || create_test_context(),
        |ctx| {
            let notes = ctx.db().collection("notes")?;
            let batch: Vec<EntityRef> = (0..3).map(|_| EntityRef::new(Note::generate())).collect();

            let result = notes.insert_many(&batch)?;
            assert_eq!(result.affected_count(), 3);
            for (entity, id) in batch.iter().zip(result.affected_ids()) {
                assert_eq!(entity.id().as_ref(), Some(id));
                assert!(!entity.is_modified());
            }
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_insert_many_stops_at_duplicate() {
    run_test(
        || create_test_context(),
        |ctx| {
            let notes = ctx.db().collection("notes")?;
            let existing = EntityRef::new(Note::generate());
            notes.insert(&existing)?;

            let fresh = EntityRef::new(Note::generate());
            let skipped = EntityRef::new(Note::generate());
            let err = notes
                .insert_many(&[fresh.clone(), existing.clone(), skipped.clone()])
                .err()
                .unwrap();
            assert_eq!(err.kind(), &ErrorKind::DuplicateKey);

            let fresh_id = fresh.id().unwrap();
            assert!(!fresh.is_modified());
            assert!(notes.find_by_id(&fresh_id)?.unwrap().ptr_eq(&fresh));
            assert!(skipped.id().is_none());

            // writing the batch again only adds what was skipped
            for entity in [&fresh, &skipped] {
                notes.save(entity)?;
            }
            assert_eq!(notes.count(&doc! {})?, 3);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_update_matching_document() {
    run_test(
        || create_test_context(),
        |ctx| {
            let notes = ctx.db().collection("notes")?;
            let note = EntityRef::new(Note::new("hello", "world"));
            let id = notes.insert(&note)?;

            let replacement = EntityRef::new(Note::new("bye", "moon"));
            let result = notes.update(&doc! { title: "hello" }, &replacement)?;
            assert_eq!(result.matched_count(), 1);
            assert_eq!(result.written_id(), Some(&id));
            assert_eq!(replacement.id(), Some(id.clone()));

            assert_eq!(notes.count(&doc! { title: "bye" })?, 1);
            assert_eq!(notes.count(&doc! { title: "hello" })?, 0);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_update_without_match() {
    run_test(
        || create_test_context(),
        |ctx| {
            let notes = ctx.db().collection("notes")?;
            let note = EntityRef::new(Note::new("hello", "world"));

            let result = notes.update(&doc! { title: "missing" }, &note)?;
            assert_eq!(result.matched_count(), 0);
            assert!(result.written_id().is_none());
            assert!(note.id().is_none());
            assert_eq!(notes.count(&doc! {})?, 0);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_upsert_inserts_when_nothing_matches() {
    run_test(
        || create_test_context(),
        |ctx| {
            let notes = ctx.db().collection("notes")?;
            let note = EntityRef::new(Note::new("hello", "world"));

            let result = notes.upsert(&doc! { _id: "greeting" }, &note)?;
            assert_eq!(result.upserted_id(), Some(&DocumentId::from("greeting")));
            assert_eq!(note.id(), Some(DocumentId::from("greeting")));

            let found = notes.find_by_id(&DocumentId::from("greeting"))?.unwrap();
            assert!(found.ptr_eq(&note));
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_remove_evicts_cached_entities() {
    run_test(
        || create_test_context(),
        |ctx| {
            let db = ctx.db();
            let saved = insert_test_notes(&db, 3)?;
            let notes = db.collection("notes")?;
            let id = saved[0].id().unwrap();
            assert!(notes.cache().contains(&id));

            let result = notes.remove(&doc! { _id: (id.clone()) })?;
            assert_eq!(result.affected_count(), 1);
            assert!(!notes.cache().contains(&id));
            assert!(notes.find_by_id(&id)?.is_none());
            assert_eq!(notes.count(&doc! {})?, 2);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_drop_collection() {
    run_test(
        || create_test_context(),
        |ctx| {
            let db = ctx.db();
            insert_test_notes(&db, 2)?;
            let notes = db.collection("notes")?;

            db.drop_collection("notes")?;
            assert!(!db.has_collection("notes")?);
            assert!(notes.cache().is_empty());
            assert_eq!(notes.count(&doc! {})?, 0);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}
