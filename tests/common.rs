// Common test utilities

use fesi::reflect::ClassRegistry;

/// Route library logs through the test harness
pub fn init_logger() {
    let _ = env_logger::builder()
        .is_test(true)
        .filter_level(log::LevelFilter::Debug)
        .try_init();
}

/// A listener covering every stub shape: event-typed, primitive, wide, reference and non-void
pub const SAMPLE_LISTENER: &str = r#"
package demo.events;

import java.util.EventListener;
import java.util.EventObject;

public interface SampleListener extends EventListener {
    void changed(SampleEvent e);
    void moved(int x, double y, char c, short s);
    void named(String name, byte[] raw) throws java.io.IOException, InterruptedException;
    void reset();
    boolean veto(SampleEvent e);
}

class SampleEvent extends EventObject {
    SampleEvent(Object source) { super(source); }
}
"#;

/// JDK registry plus `SAMPLE_LISTENER`
pub fn sample_registry() -> ClassRegistry {
    let mut registry = ClassRegistry::with_jdk();
    registry.load_source(SAMPLE_LISTENER).expect("sample listener parses");
    registry
}
