use lisogo::doc;
use lisogo::document::DocumentId;
use lisogo::entity::EntityRef;
use lisogo::errors::ErrorKind;
use lisogo_int_test::models::{Note, Tag};
use lisogo_int_test::test_util::{cleanup, create_test_context, run_test};

#[test]
fn test_save_and_retrieve() {
    run_test(
        || create_test_context(),
        |ctx| {
            let db = ctx.db();
            let note = EntityRef::new(Note::new("hello", "world"));
            note.save(&db)?;
            let id = note.id().unwrap();

            let copy = EntityRef::new(Note::default());
            copy.retrieve(&id, &db)?;
            assert_eq!(copy.id(), Some(id));
            assert!(!copy.is_modified());
            assert_eq!(copy.with(|n: &Note| n.title().to_string())?, "hello");
            assert_eq!(copy.with(|n: &Note| n.body().to_string())?, "world");
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_unmodified_entity_is_not_written() {
    run_test(
        || create_test_context(),
        |ctx| {
            let db = ctx.db();
            let note = EntityRef::new(Note::new("hello", "world"));
            note.save(&db)?;
            let id = note.id().unwrap();

            // change the stored copy behind the entity's back
            let notes = db.collection("notes")?;
            db.store().save(notes.namespace(), doc! { _id: (id.clone()), _type: "Note", title: "changed" })?;

            note.save(&db)?;
            let copy = EntityRef::new(Note::default());
            copy.retrieve(&id, &db)?;
            assert_eq!(copy.with(|n: &Note| n.title().to_string())?, "changed");
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_save_after_change_replaces_stored_document() {
    run_test(
        || create_test_context(),
        |ctx| {
            let db = ctx.db();
            let note = EntityRef::new(Note::new("hello", "world"));
            note.save(&db)?;
            let id = note.id().unwrap();

            note.with_mut(|n: &mut Note| n.set_body("everyone"))?;
            note.save(&db)?;
            assert_eq!(note.id(), Some(id.clone()));
            assert_eq!(db.collection("notes")?.count(&doc! {})?, 1);

            let copy = EntityRef::new(Note::default());
            copy.retrieve(&id, &db)?;
            assert_eq!(copy.with(|n: &Note| n.body().to_string())?, "everyone");
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_retrieve_with_query_document() {
    run_test(
        || create_test_context(),
        |ctx| {
            let db = ctx.db();
            let note = EntityRef::new(Note::new("hello", "world"));
            note.save(&db)?;
            let id = note.id().unwrap();

            let copy = EntityRef::new(Note::default());
            copy.retrieve(doc! { _id: (id.clone()), title: "hello" }, &db)?;
            assert_eq!(copy.id(), Some(id.clone()));

            let err = copy.retrieve(doc! { title: "hello" }, &db).err().unwrap();
            assert_eq!(err.kind(), &ErrorKind::RetrieveError);

            let err = copy.retrieve(doc! { _id: (id), title: "other" }, &db).err().unwrap();
            assert_eq!(err.kind(), &ErrorKind::NotFound);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_retrieve_missing_id() {
    run_test(
        || create_test_context(),
        |ctx| {
            let note = EntityRef::new(Note::default());
            let err = note.retrieve(DocumentId::generate(), &ctx.db()).err().unwrap();
            assert_eq!(err.kind(), &ErrorKind::NotFound);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_embedded_only_type_cannot_be_saved_or_retrieved() {
    run_test(
        || create_test_context(),
        |ctx| {
            let db = ctx.db();
            let tag = EntityRef::new(Tag::new("rust"));

            let err = tag.save(&db).err().unwrap();
            assert_eq!(err.kind(), &ErrorKind::PersistError);

            let err = tag.retrieve(1i64, &db).err().unwrap();
            assert_eq!(err.kind(), &ErrorKind::RetrieveError);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}
