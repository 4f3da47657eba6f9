// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use super::factory::Factory;
use crate::error::{EngineError, EngineResult};
use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

struct ServiceEntry {
    service: Rc<dyn Any>,
    type_name: &'static str,
}

/// A typed registry of singleton services keyed by [`TypeId`].
///
/// The container owns exactly one instance per type. Services are handed out
/// as `Rc<T>` so subsystems can keep explicit references to the services they
/// depend on (for example inside event subscriptions); services that need to
/// mutate state do so through interior mutability, since the whole runtime
/// lives on a single simulation thread.
///
/// On teardown services are dropped in strict reverse registration order,
/// mirroring the order in which they were constructed.
///
/// # Example
///
/// ```rust
/// use vesper_core::services::ServiceContainer;
///
/// struct MyService { value: i32 }
///
/// let mut services = ServiceContainer::new();
/// services.add_singleton(MyService { value: 42 }).unwrap();
///
/// let svc = services.resolve::<MyService>().unwrap();
/// assert_eq!(svc.value, 42);
/// ```
#[derive(Default)]
pub struct ServiceContainer {
    services: HashMap<TypeId, ServiceEntry>,
    order: Vec<TypeId>,
}

impl ServiceContainer {
    /// Creates an empty service container.
    #[must_use]
    pub fn new() -> Self {
        Self {
            services: HashMap::new(),
            order: Vec::new(),
        }
    }

    /// Registers `service` as the singleton instance of `T`.
    ///
    /// Fails with [`EngineError::DuplicateService`] if an instance of `T` is
    /// already registered; the previous instance must be removed first.
    pub fn add_singleton<T: 'static>(&mut self, service: T) -> EngineResult<Rc<T>> {
        let key = TypeId::of::<T>();
        if self.services.contains_key(&key) {
            return Err(EngineError::DuplicateService {
                type_name: type_name::<T>(),
            });
        }

        let service = Rc::new(service);
        self.services.insert(
            key,
            ServiceEntry {
                service: service.clone(),
                type_name: type_name::<T>(),
            },
        );
        self.order.push(key);
        log::info!("Service registered: {}", type_name::<T>());
        Ok(service)
    }

    /// Returns a shared reference to the registered instance of `T`.
    ///
    /// Fails with [`EngineError::ServiceNotFound`] if `T` is not registered.
    pub fn resolve<T: 'static>(&self) -> EngineResult<Rc<T>> {
        self.try_resolve::<T>()
            .ok_or(EngineError::ServiceNotFound {
                type_name: type_name::<T>(),
            })
    }

    /// Alias of [`resolve`](Self::resolve).
    pub fn get_singleton<T: 'static>(&self) -> EngineResult<Rc<T>> {
        self.resolve::<T>()
    }

    /// Returns the registered instance of `T`, or `None`.
    #[must_use]
    pub fn try_resolve<T: 'static>(&self) -> Option<Rc<T>> {
        self.services
            .get(&TypeId::of::<T>())
            .and_then(|entry| entry.service.clone().downcast::<T>().ok())
    }

    /// Unregisters the instance of `T` and drops the container's reference to it.
    ///
    /// Fails with [`EngineError::ServiceNotFound`] if `T` is not registered.
    pub fn remove_singleton<T: 'static>(&mut self) -> EngineResult<()> {
        let key = TypeId::of::<T>();
        let entry = self
            .services
            .remove(&key)
            .ok_or(EngineError::ServiceNotFound {
                type_name: type_name::<T>(),
            })?;
        self.order.retain(|id| *id != key);
        log::debug!("Service removed: {}", entry.type_name);
        Ok(())
    }

    /// Registers a [`Factory`] producing instances of `T`.
    pub fn add_factory<T: 'static>(&mut self, factory: Factory<T>) -> EngineResult<()> {
        self.add_singleton(factory).map(|_| ())
    }

    /// Builds a new `T` through its registered [`Factory`].
    ///
    /// Fails with [`EngineError::ServiceNotFound`] if no factory for `T` exists.
    pub fn create<T: 'static>(&self) -> EngineResult<T> {
        let factory = self.resolve::<Factory<T>>()?;
        factory.create(self)
    }

    /// Returns `true` if a service of type `T` is registered.
    #[must_use]
    pub fn contains<T: 'static>(&self) -> bool {
        self.services.contains_key(&TypeId::of::<T>())
    }

    /// Returns the number of registered services.
    #[must_use]
    pub fn len(&self) -> usize {
        self.services.len()
    }

    /// Returns `true` if no services are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }

    /// Returns the type names of the registered services, in registration order.
    pub fn type_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.order
            .iter()
            .filter_map(|id| self.services.get(id).map(|entry| entry.type_name))
    }

    /// Removes every service, in reverse registration order.
    pub fn clear(&mut self) {
        while let Some(key) = self.order.pop() {
            if let Some(entry) = self.services.remove(&key) {
                log::debug!("Service removed: {}", entry.type_name);
            }
        }
    }
}

impl Drop for ServiceContainer {
    fn drop(&mut self) {
        self.clear();
    }
}

impl fmt::Debug for ServiceContainer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.type_names()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[derive(Debug)]
    struct FakeDevice {
        name: String,
    }

    #[derive(Debug)]
    struct FakeRenderer {}

    struct DropTracker {
        label: &'static str,
        log: Rc<RefCell<Vec<&'static str>>>,
    }

    impl Drop for DropTracker {
        fn drop(&mut self) {
            self.log.borrow_mut().push(self.label);
        }
    }

    struct ServiceA(DropTracker);
    struct ServiceB(DropTracker);
    struct ServiceC(DropTracker);

    #[test]
    fn test_add_and_resolve() {
        let mut services = ServiceContainer::new();
        services
            .add_singleton(FakeDevice {
                name: "GPU-0".to_string(),
            })
            .unwrap();

        let retrieved = services.resolve::<FakeDevice>().unwrap();
        assert_eq!(retrieved.name, "GPU-0");
        assert!(Rc::ptr_eq(
            &retrieved,
            &services.get_singleton::<FakeDevice>().unwrap()
        ));
    }

    #[test]
    fn test_resolve_missing_fails() {
        let services = ServiceContainer::new();
        let err = services.resolve::<FakeDevice>().unwrap_err();
        assert!(matches!(err, EngineError::ServiceNotFound { .. }));
        assert!(services.try_resolve::<FakeDevice>().is_none());
    }

    #[test]
    fn test_duplicate_registration_fails() {
        let mut services = ServiceContainer::new();
        services.add_singleton(FakeRenderer {}).unwrap();
        let err = services.add_singleton(FakeRenderer {}).unwrap_err();
        assert!(matches!(err, EngineError::DuplicateService { .. }));
        assert_eq!(services.len(), 1);
    }

    #[test]
    fn test_remove_then_add_again() {
        let mut services = ServiceContainer::new();
        services
            .add_singleton(FakeDevice {
                name: "old".to_string(),
            })
            .unwrap();
        services.remove_singleton::<FakeDevice>().unwrap();
        assert!(!services.contains::<FakeDevice>());
        assert!(services.remove_singleton::<FakeDevice>().is_err());

        services
            .add_singleton(FakeDevice {
                name: "new".to_string(),
            })
            .unwrap();
        assert_eq!(services.resolve::<FakeDevice>().unwrap().name, "new");
    }

    #[test]
    fn test_resolution_tracks_net_registration_count() {
        // (add?, expected resolvable afterwards)
        let script = [
            (true, true),
            (false, false),
            (true, true),
            (true, true), // rejected duplicate, count stays at one
            (false, false),
            (false, false), // rejected removal, count stays at zero
        ];
        let mut services = ServiceContainer::new();
        for (add, resolvable) in script {
            if add {
                let _ = services.add_singleton(FakeRenderer {});
            } else {
                let _ = services.remove_singleton::<FakeRenderer>();
            }
            assert_eq!(services.resolve::<FakeRenderer>().is_ok(), resolvable);
        }
    }

    #[test]
    fn test_teardown_is_reverse_registration_order() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let tracker = |label| DropTracker {
            label,
            log: log.clone(),
        };

        let mut services = ServiceContainer::new();
        services.add_singleton(ServiceA(tracker("a"))).unwrap();
        services.add_singleton(ServiceB(tracker("b"))).unwrap();
        services.add_singleton(ServiceC(tracker("c"))).unwrap();
        assert_eq!(
            services.type_names().count(),
            3,
            "all three services should be registered"
        );
        drop(services);

        assert_eq!(*log.borrow(), vec!["c", "b", "a"]);
    }

    #[test]
    fn test_factory_builds_from_other_services() {
        let mut services = ServiceContainer::new();
        services
            .add_singleton(FakeDevice {
                name: "GPU".to_string(),
            })
            .unwrap();
        services
            .add_factory(Factory::new(|services: &ServiceContainer| {
                let device = services.resolve::<FakeDevice>()?;
                Ok(format!("renderer on {}", device.name))
            }))
            .unwrap();

        assert_eq!(services.create::<String>().unwrap(), "renderer on GPU");
        assert_eq!(services.create::<String>().unwrap(), "renderer on GPU");
        assert!(services.create::<u32>().is_err());
    }

    #[test]
    fn test_default_is_empty() {
        let services = ServiceContainer::default();
        assert!(services.is_empty());
    }
}
