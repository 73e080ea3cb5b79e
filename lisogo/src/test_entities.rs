use crate::collection::Collection;
use crate::database::Database;
use crate::entity::{Entity, EntityRef, EntityState, TypeRegistry};
use crate::errors::OdmResult;

#[derive(Default)]
pub(crate) struct Note {
    state: EntityState,
}

impl Note {
    pub(crate) fn new(title: &str, body: &str) -> Self {
        let mut note = Note::default();
        note.state.set("title", title);
        note.state.set("body", body);
        note
    }

    pub(crate) fn title(&self) -> &str {
        self.state.get_str("title").unwrap_or_default()
    }

    pub(crate) fn set_title(&mut self, title: &str) {
        self.state.set("title", title);
    }
}

impl Entity for Note {
    fn type_name(&self) -> &str {
        "Note"
    }

    fn state(&self) -> &EntityState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut EntityState {
        &mut self.state
    }

    fn collection(&self, db: &Database) -> OdmResult<Option<Collection>> {
        Ok(Some(db.collection("notes")?))
    }
}

/// Can only be embedded.
#[derive(Default)]
pub(crate) struct Tag {
    state: EntityState,
}

impl Tag {
    pub(crate) fn new(label: &str) -> Self {
        let mut tag = Tag::default();
        tag.state.set("label", label);
        tag
    }

    pub(crate) fn set_parent(&mut self, parent: &EntityRef) {
        self.state.set("parent", parent);
    }

    pub(crate) fn label(&self) -> &str {
        self.state.get_str("label").unwrap_or_default()
    }
}

impl Entity for Tag {
    fn type_name(&self) -> &str {
        "Tag"
    }

    fn state(&self) -> &EntityState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut EntityState {
        &mut self.state
    }

    fn collection(&self, _db: &Database) -> OdmResult<Option<Collection>> {
        Ok(None)
    }
}

#[derive(Default)]
pub(crate) struct User {
    state: EntityState,
}

impl User {
    pub(crate) fn new(name: &str) -> Self {
        let mut user = User::default();
        user.state.set("name", name);
        user
    }

    pub(crate) fn name(&self) -> &str {
        self.state.get_str("name").unwrap_or_default()
    }

    pub(crate) fn friend(&self) -> Option<EntityRef> {
        self.state.get_entity("friend").cloned()
    }

    pub(crate) fn set_friend(&mut self, friend: &EntityRef) {
        self.state.set("friend", friend);
    }
}

impl Entity for User {
    fn type_name(&self) -> &str {
        "User"
    }

    fn state(&self) -> &EntityState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut EntityState {
        &mut self.state
    }

    fn collection(&self, db: &Database) -> OdmResult<Option<Collection>> {
        Ok(Some(db.collection("users")?))
    }
}

#[derive(Default)]
pub(crate) struct Post {
    state: EntityState,
}

impl Post {
    pub(crate) fn new(title: &str, author: &EntityRef) -> Self {
        let mut post = Post::default();
        post.state.set("title", title);
        post.state.set("author", author);
        post
    }
}

impl Entity for Post {
    fn type_name(&self) -> &str {
        "Post"
    }

    fn state(&self) -> &EntityState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut EntityState {
        &mut self.state
    }

    fn collection(&self, db: &Database) -> OdmResult<Option<Collection>> {
        Ok(Some(db.collection("posts")?))
    }
}

pub(crate) fn test_registry() -> TypeRegistry {
    let registry = TypeRegistry::new("test.model");
    registry
        .register::<Note>()
        .register::<Tag>()
        .register::<User>()
        .register::<Post>();
    registry
}

pub(crate) fn test_database() -> Database {
    match Database::builder().name("test").registry(test_registry()).open() {
        Ok(db) => db,
        Err(err) => panic!("Failed to open test database: {}", err),
    }
}
