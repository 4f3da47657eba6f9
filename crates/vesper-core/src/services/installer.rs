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

use super::container::ServiceContainer;
use crate::error::EngineResult;

/// Adds a subsystem's services to the container, and removes them again.
///
/// Installers are the only sanctioned way services enter or leave the
/// container. `uninstall` must undo exactly what `install` did, in reverse.
pub trait Installer {
    /// A short name used in logs.
    fn name(&self) -> &str;

    /// Registers this subsystem's services.
    fn install(&mut self, services: &mut ServiceContainer) -> EngineResult<()>;

    /// Unregisters this subsystem's services.
    fn uninstall(&mut self, services: &mut ServiceContainer) -> EngineResult<()>;
}

/// An ordered list of installers, run front to back and undone back to front.
#[derive(Default)]
pub struct InstallerStack {
    installers: Vec<Box<dyn Installer>>,
    installed: usize,
}

impl InstallerStack {
    /// Creates an empty stack.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an installer. Order of pushes is the boot order.
    pub fn push(&mut self, installer: Box<dyn Installer>) {
        self.installers.push(installer);
    }

    /// Returns the number of installers in the stack.
    pub fn len(&self) -> usize {
        self.installers.len()
    }

    /// Returns `true` if the stack holds no installers.
    pub fn is_empty(&self) -> bool {
        self.installers.is_empty()
    }

    /// Runs every installer in order.
    ///
    /// On failure the installers that already succeeded are uninstalled in
    /// reverse order before the error is returned.
    pub fn install_all(&mut self, services: &mut ServiceContainer) -> EngineResult<()> {
        while self.installed < self.installers.len() {
            let installer = &mut self.installers[self.installed];
            log::debug!("Installing {}", installer.name());
            if let Err(e) = installer.install(services) {
                log::error!("Installer '{}' failed: {e}", installer.name());
                if let Err(undo) = self.uninstall_all(services) {
                    log::error!("Rollback after failed install also failed: {undo}");
                }
                return Err(e);
            }
            self.installed += 1;
        }
        Ok(())
    }

    /// Uninstalls every installed installer, in reverse order.
    ///
    /// Every installer is given a chance to run; the first error is returned.
    pub fn uninstall_all(&mut self, services: &mut ServiceContainer) -> EngineResult<()> {
        let mut first_error = None;
        while self.installed > 0 {
            self.installed -= 1;
            let installer = &mut self.installers[self.installed];
            log::debug!("Uninstalling {}", installer.name());
            if let Err(e) = installer.uninstall(services) {
                log::error!("Uninstaller '{}' failed: {e}", installer.name());
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngineError;
    use std::cell::RefCell;
    use std::rc::Rc;

    struct Recording {
        name: &'static str,
        log: Rc<RefCell<Vec<String>>>,
        fail_install: bool,
    }

    struct Marker;

    impl Installer for Recording {
        fn name(&self) -> &str {
            self.name
        }

        fn install(&mut self, _services: &mut ServiceContainer) -> EngineResult<()> {
            if self.fail_install {
                return Err(EngineError::NativeInitFailure(self.name.to_string()));
            }
            self.log.borrow_mut().push(format!("+{}", self.name));
            Ok(())
        }

        fn uninstall(&mut self, _services: &mut ServiceContainer) -> EngineResult<()> {
            self.log.borrow_mut().push(format!("-{}", self.name));
            Ok(())
        }
    }

    fn recording(name: &'static str, log: &Rc<RefCell<Vec<String>>>, fail: bool) -> Box<dyn Installer> {
        Box::new(Recording {
            name,
            log: log.clone(),
            fail_install: fail,
        })
    }

    #[test]
    fn uninstall_reverses_install_order() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut stack = InstallerStack::new();
        stack.push(recording("events", &log, false));
        stack.push(recording("window", &log, false));
        stack.push(recording("scene", &log, false));

        let mut services = ServiceContainer::new();
        stack.install_all(&mut services).unwrap();
        stack.uninstall_all(&mut services).unwrap();

        assert_eq!(
            *log.borrow(),
            vec!["+events", "+window", "+scene", "-scene", "-window", "-events"]
        );
    }

    #[test]
    fn failed_install_rolls_back_completed_steps() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut stack = InstallerStack::new();
        stack.push(recording("events", &log, false));
        stack.push(recording("window", &log, true));
        stack.push(recording("scene", &log, false));

        let mut services = ServiceContainer::new();
        services.add_singleton(Marker).unwrap();
        let err = stack.install_all(&mut services).unwrap_err();

        assert!(matches!(err, EngineError::NativeInitFailure(_)));
        assert_eq!(*log.borrow(), vec!["+events", "-events"]);
        // Nothing is left to undo.
        stack.uninstall_all(&mut services).unwrap();
        assert_eq!(log.borrow().len(), 2);
    }
}
