use lisogo::collection::{limit_to, project, skip_by, FindOptions};
use lisogo::doc;
use lisogo::entity::EntityRef;
use lisogo::errors::{ErrorKind, OdmResult};
use lisogo_int_test::models::Note;
use lisogo_int_test::test_util::{cleanup, create_test_context, insert_test_notes, run_test};

#[test]
fn test_find_all() {
    run_test(
        || create_test_context(),
        |ctx| {
            let db = ctx.db();
            let saved = insert_test_notes(&db, 4)?;
            let found = db.collection("notes")?.find(&doc! {})?.collect::<OdmResult<Vec<_>>>()?;
            assert_eq!(found.len(), 4);
            for entity in &found {
                assert!(saved.iter().any(|it| it.ptr_eq(entity)));
            }
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_find_by_field() {
    run_test(
        || create_test_context(),
        |ctx| {
            let notes = ctx.db().collection("notes")?;
            notes.insert(&EntityRef::new(Note::new("a", "first")))?;
            notes.insert(&EntityRef::new(Note::new("b", "second")))?;
            notes.insert(&EntityRef::new(Note::new("a", "third")))?;

            let found = notes.find(&doc! { title: "a" })?.collect::<OdmResult<Vec<_>>>()?;
            assert_eq!(found.len(), 2);

            let one = notes.find_one(&doc! { body: "second" })?.unwrap();
            assert_eq!(one.with(|n: &Note| n.title().to_string())?, "b");

            assert!(notes.find_one(&doc! { title: "z" })?.is_none());
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_skip_and_limit() {
    run_test(
        || create_test_context(),
        |ctx| {
            let db = ctx.db();
            insert_test_notes(&db, 10)?;
            let notes = db.collection("notes")?;

            assert_eq!(notes.find_with_options(&doc! {}, skip_by(8))?.count(), 2);
            assert_eq!(notes.find_with_options(&doc! {}, limit_to(3))?.count(), 3);
            assert_eq!(notes.find_with_options(&doc! {}, skip_by(4).limit(4))?.count(), 4);
            assert_eq!(notes.find_with_options(&doc! {}, skip_by(20))?.count(), 0);
            assert_eq!(notes.find_with_options(&doc! {}, FindOptions::new().limit(0))?.count(), 0);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_projection_returns_partial_uncached_entities() {
    run_test(
        || create_test_context(),
        |ctx| {
            let notes = ctx.db().collection("notes")?;
            let note = EntityRef::new(Note::new("hello", "world"));
            let id = notes.insert(&note)?;

            let partial = notes
                .find_with_options(&doc! { _id: (id.clone()) }, project(&["title"]))?
                .next()
                .unwrap()?;
            assert!(!partial.ptr_eq(&note));
            assert_eq!(partial.id(), Some(id.clone()));
            assert_eq!(partial.with(|n: &Note| n.title().to_string())?, "hello");
            assert_eq!(partial.with(|n: &Note| n.body().to_string())?, "");

            // the cached instance is untouched
            assert!(notes.cache().get(&id).unwrap().ptr_eq(&note));
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_document_without_type_cannot_be_read() {
    run_test(
        || create_test_context(),
        |ctx| {
            let db = ctx.db();
            let notes = db.collection("notes")?;
            db.store().insert(notes.namespace(), doc! { _id: 1, title: "raw" })?;

            let err = notes.find(&doc! {})?.next().unwrap().err().unwrap();
            assert_eq!(err.kind(), &ErrorKind::MissingField);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_unknown_type_cannot_be_read() {
    run_test(
        || create_test_context(),
        |ctx| {
            let db = ctx.db();
            let notes = db.collection("notes")?;
            db.store().insert(notes.namespace(), doc! { _id: 1, _type: "Ghost" })?;

            let err = notes.find_one(&doc! {}).err().unwrap();
            assert_eq!(err.kind(), &ErrorKind::UnknownType);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}
