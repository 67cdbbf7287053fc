use super::table::DEFAULT_MAX_SIZE;
use super::worker::{StoreEnvelope, StoreRequest, StoreWorker, spawn_store_worker};
use crate::core::{MoatError, Result};
use crate::model::{Entity, ModelClass, ModelLayout, UID_FIELD};
use crate::provider::{
    Completion, CorrelationId, Mapper, PersistenceProvider, ProviderOptions, StoreOp,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use tokio::sync::oneshot;
use uuid::Uuid;

/// The in-memory reference provider, registered as `hash`.
pub struct HashProvider {
    max_size: AtomicUsize,
}

impl HashProvider {
    pub const NAME: &'static str = "hash";

    pub fn new() -> Self {
        Self {
            max_size: AtomicUsize::new(DEFAULT_MAX_SIZE),
        }
    }

    /// Capacity given to mappers built from now on
    pub fn max_size(&self) -> usize {
        self.max_size.load(Ordering::SeqCst)
    }
}

impl Default for HashProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl PersistenceProvider for HashProvider {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn init(&self, options: &ProviderOptions) -> Result<()> {
        if let Some(max_size) = options.max_size {
            if max_size == 0 {
                return Err(MoatError::InvalidOption(
                    "maxSize should be a positive number.".to_string(),
                ));
            }
            self.max_size.store(max_size, Ordering::SeqCst);
        }
        Ok(())
    }

    fn build(&self, class: &ModelClass) -> Result<Arc<dyn Mapper>> {
        let mapper = HashMapper::spawn(class.layout()?, self.max_size())?;
        Ok(Arc::new(mapper))
    }
}

/// Mapper backed by a private [`StoreTable`](super::StoreTable) on its own
/// worker.
pub struct HashMapper {
    layout: Arc<ModelLayout>,
    worker: StoreWorker,
    max_size: usize,
    next_seq: AtomicU64,
}

impl HashMapper {
    pub fn spawn(layout: Arc<ModelLayout>, max_size: usize) -> Result<Self> {
        let worker = spawn_store_worker(layout.name(), max_size)?;
        Ok(Self {
            layout,
            worker,
            max_size,
            next_seq: AtomicU64::new(0),
        })
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    fn check_entity(&self, entity: &Entity) -> Result<()> {
        if !entity.belongs_to(&self.layout) {
            return Err(MoatError::IncompatibleEntity);
        }
        Ok(())
    }

    fn schedule<T>(
        &self,
        op: StoreOp,
        uid: Option<&str>,
        request: impl FnOnce(oneshot::Sender<Result<T>>) -> StoreRequest,
    ) -> Result<Completion<T>> {
        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
        let correlation = CorrelationId::new(op, uid, seq);
        let (reply, completion) = Completion::channel(correlation.clone());
        self.worker.submit(StoreEnvelope {
            correlation,
            request: request(reply),
        })?;
        Ok(completion)
    }
}

impl Mapper for HashMapper {
    fn add(&self, entity: &mut Entity) -> Result<Completion<Entity>> {
        self.check_entity(entity)?;
        if entity.uid().is_none_or(str::is_empty) {
            entity.set_uid(Uuid::new_v4().to_string());
        }
        let snapshot = entity.clone();
        self.schedule(StoreOp::Add, entity.uid(), |reply| StoreRequest::Add {
            entity: snapshot,
            reply,
        })
    }

    fn update(&self, entity: &Entity) -> Result<Completion<Entity>> {
        self.check_entity(entity)?;
        let uid = required_uid(entity)?;
        let snapshot = entity.clone();
        self.schedule(StoreOp::Update, Some(uid), |reply| StoreRequest::Update {
            entity: snapshot,
            reply,
        })
    }

    fn update_fields(
        &self,
        entity: &Entity,
        fields: &[&str],
    ) -> Result<Completion<(Entity, Vec<String>)>> {
        self.check_entity(entity)?;
        let uid = required_uid(entity)?;
        if fields.is_empty() {
            return Err(MoatError::MissingArgument("[fields] variable".to_string()));
        }
        for field in fields {
            if *field != UID_FIELD && !self.layout.has_attribute(field) {
                return Err(MoatError::UnknownAttribute(
                    field.to_string(),
                    self.layout.name().to_string(),
                ));
            }
        }

        let fields: Vec<String> = fields.iter().map(|f| f.to_string()).collect();
        let snapshot = entity.clone();
        self.schedule(StoreOp::UpdateFields, Some(uid), |reply| {
            StoreRequest::UpdateFields {
                entity: snapshot,
                fields,
                reply,
            }
        })
    }

    fn remove(&self, uid: &str) -> Result<Completion<Entity>> {
        if uid.is_empty() {
            return Err(MoatError::MissingArgument("uid".to_string()));
        }
        self.schedule(StoreOp::Remove, Some(uid), |reply| StoreRequest::Remove {
            uid: uid.to_string(),
            reply,
        })
    }

    fn find_by_uid(&self, uid: &str) -> Result<Completion<Entity>> {
        if uid.is_empty() {
            return Err(MoatError::MissingArgument("uid".to_string()));
        }
        self.schedule(StoreOp::FindByUid, Some(uid), |reply| {
            StoreRequest::FindByUid {
                uid: uid.to_string(),
                reply,
            }
        })
    }

    fn find_all_uids(&self) -> Result<Completion<Vec<String>>> {
        self.schedule(StoreOp::FindAllUids, None, |reply| {
            StoreRequest::FindAllUids { reply }
        })
    }

    fn count(&self) -> Result<Completion<usize>> {
        self.schedule(StoreOp::Count, None, |reply| StoreRequest::Count { reply })
    }
}

fn required_uid(entity: &Entity) -> Result<&str> {
    entity
        .uid()
        .filter(|uid| !uid.is_empty())
        .ok_or_else(|| MoatError::MissingArgument("entity.uid".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::AttributeType;

    fn class() -> ModelClass {
        let class = ModelClass::open("Note");
        class.define_attribute("body", AttributeType::parse("string")).unwrap();
        class.seal().unwrap();
        class
    }

    fn mapper(class: &ModelClass) -> Arc<dyn Mapper> {
        HashProvider::new().build(class).unwrap()
    }

    #[test]
    fn test_argument_checks_fail_before_scheduling() {
        let class = class();
        let mapper = mapper(&class);
        let mut entity = class.new_instance().unwrap();

        assert!(matches!(
            mapper.update(&entity),
            Err(MoatError::MissingArgument(ref what)) if what == "entity.uid"
        ));
        assert!(matches!(
            mapper.update_fields(&entity, &["body"]),
            Err(MoatError::MissingArgument(_))
        ));
        entity.set_uid("n-1");
        assert!(matches!(
            mapper.update_fields(&entity, &[]),
            Err(MoatError::MissingArgument(_))
        ));
        assert!(matches!(
            mapper.update_fields(&entity, &["title"]),
            Err(MoatError::UnknownAttribute(_, _))
        ));
        assert!(matches!(mapper.remove(""), Err(MoatError::MissingArgument(_))));
        assert!(matches!(
            mapper.find_by_uid(""),
            Err(MoatError::MissingArgument(_))
        ));

        let mut foreign = self::class().new_instance().unwrap();
        assert!(matches!(
            mapper.add(&mut foreign),
            Err(MoatError::IncompatibleEntity)
        ));
        assert!(foreign.uid().is_none());

        assert_eq!(mapper.count().unwrap().wait().unwrap(), 0);
    }

    #[test]
    fn test_add_assigns_uuid_v4() {
        let class = class();
        let mapper = mapper(&class);
        let mut entity = class.new_instance().unwrap();

        let stored = mapper.add(&mut entity).unwrap().wait().unwrap();
        let uid = entity.uid().unwrap().to_string();
        let parsed = Uuid::parse_str(&uid).unwrap();
        assert_eq!(parsed.get_version_num(), 4);
        let groups: Vec<usize> = uid.split('-').map(str::len).collect();
        assert_eq!(groups, vec![8, 4, 4, 4, 12]);
        assert_eq!(stored.uid(), Some(uid.as_str()));
    }

    #[test]
    fn test_init_changes_capacity_of_later_mappers() {
        let class = class();
        let provider = HashProvider::new();
        assert_eq!(provider.max_size(), DEFAULT_MAX_SIZE);
        provider
            .init(&ProviderOptions::new().max_size(1))
            .unwrap();
        provider.init(&ProviderOptions::new()).unwrap();
        assert_eq!(provider.max_size(), 1);

        let mapper = provider.build(&class).unwrap();
        let mut first = class.new_instance().unwrap();
        let mut second = class.new_instance().unwrap();
        mapper.add(&mut first).unwrap().wait().unwrap();
        let err = mapper.add(&mut second).unwrap().wait().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Size full, remove entries prior to adding a new one. Size:1"
        );
    }
}
