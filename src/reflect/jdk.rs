//! Declarations of the platform classes adaptor synthesis and dispatch refer to

pub(crate) const JDK_SOURCES: &[&str] = &[JAVA_LANG, JAVA_LANG_REFLECT, JAVA_IO, JAVA_UTIL, JAVA_AWT, JAVA_AWT_EVENT, JAVA_BEANS];

const JAVA_LANG: &str = r#"
package java.lang;

public class Object {
    public Object() {}
    public final native Class getClass();
    public native int hashCode();
    public boolean equals(Object obj) {}
    public String toString() {}
    public final native void notify();
    public final native void notifyAll();
    public final native void wait(long timeout) throws InterruptedException;
    public final void wait(long timeout, int nanos) throws InterruptedException {}
    public final void wait() throws InterruptedException {}
}

public interface Cloneable {}
public interface Runnable { void run(); }

public final class Class implements java.io.Serializable {
    public static Class forName(String className) throws ClassNotFoundException {}
    public String getName() {}
    public java.lang.reflect.Method[] getMethods() {}
    public java.lang.reflect.Method getMethod(String name, Class[] parameterTypes) throws NoSuchMethodException {}
    public boolean isInterface() {}
}

public final class String implements java.io.Serializable {
    public String() {}
    public int length() {}
    public char charAt(int index) {}
}

public abstract class Number implements java.io.Serializable {
    public abstract int intValue();
    public abstract long longValue();
    public abstract float floatValue();
    public abstract double doubleValue();
}

public final class Boolean implements java.io.Serializable {
    public static final Class TYPE;
    public Boolean(boolean value) {}
    public boolean booleanValue() {}
}

public final class Character implements java.io.Serializable {
    public static final Class TYPE;
    public Character(char value) {}
    public char charValue() {}
}

public final class Byte extends Number {
    public static final Class TYPE;
    public Byte(byte value) {}
}

public final class Short extends Number {
    public static final Class TYPE;
    public Short(short value) {}
}

public final class Integer extends Number {
    public static final Class TYPE;
    public Integer(int value) {}
}

public final class Long extends Number {
    public static final Class TYPE;
    public Long(long value) {}
}

public final class Float extends Number {
    public static final Class TYPE;
    public Float(float value) {}
}

public final class Double extends Number {
    public static final Class TYPE;
    public Double(double value) {}
}

public final class Void {
    public static final Class TYPE;
}

public class Throwable implements java.io.Serializable {
    public Throwable() {}
    public Throwable(String message) {}
    public String getMessage() {}
}

public class Exception extends Throwable {
    public Exception() {}
    public Exception(String message) {}
}

public class RuntimeException extends Exception {}
public class InterruptedException extends Exception {}
public class ClassNotFoundException extends Exception {}
public class NoSuchMethodException extends Exception {}
public class IllegalAccessException extends Exception {}

public class Error extends Throwable {
    public Error() {}
    public Error(String message) {}
}

public class LinkageError extends Error {
    public LinkageError(String message) {}
}

public class NoClassDefFoundError extends LinkageError {
    public NoClassDefFoundError() {}
    public NoClassDefFoundError(String message) {}
}
"#;

const JAVA_LANG_REFLECT: &str = r#"
package java.lang.reflect;

public final class Method {
    public String getName() {}
    public Class getDeclaringClass() {}
    public Class[] getParameterTypes() {}
    public Object invoke(Object obj, Object[] args) throws IllegalAccessException, InvocationTargetException {}
}

public class InvocationTargetException extends Exception {}
"#;

const JAVA_IO: &str = r#"
package java.io;

public interface Serializable {}
public class IOException extends Exception {}
"#;

const JAVA_UTIL: &str = r#"
package java.util;

import java.io.Serializable;

public interface EventListener {}

public class EventObject implements Serializable {
    public EventObject(Object source) {}
    public Object getSource() {}
    public String toString() {}
}
"#;

const JAVA_AWT: &str = r#"
package java.awt;

import java.util.EventObject;

public abstract class AWTEvent extends EventObject {
    public AWTEvent(Object source, int id) {}
    public int getID() {}
    public String paramString() {}
}
"#;

const JAVA_AWT_EVENT: &str = r#"
package java.awt.event;

import java.awt.AWTEvent;
import java.util.EventListener;

public class ComponentEvent extends AWTEvent {
    public Object getComponent() {}
}

public abstract class InputEvent extends ComponentEvent {
    public int getModifiers() {}
    public long getWhen() {}
    public void consume() {}
}

public class ActionEvent extends AWTEvent {
    public String getActionCommand() {}
    public int getModifiers() {}
}

public class MouseEvent extends InputEvent {
    public int getX() {}
    public int getY() {}
    public int getClickCount() {}
}

public class KeyEvent extends InputEvent {
    public int getKeyCode() {}
    public char getKeyChar() {}
}

public class WindowEvent extends ComponentEvent {
    public Object getWindow() {}
}

public class FocusEvent extends ComponentEvent {
    public boolean isTemporary() {}
}

public class ItemEvent extends AWTEvent {
    public Object getItem() {}
    public int getStateChange() {}
}

public class TextEvent extends AWTEvent {}

public class AdjustmentEvent extends AWTEvent {
    public int getValue() {}
}

public interface ActionListener extends EventListener {
    void actionPerformed(ActionEvent e);
}

public interface MouseListener extends EventListener {
    void mouseClicked(MouseEvent e);
    void mousePressed(MouseEvent e);
    void mouseReleased(MouseEvent e);
    void mouseEntered(MouseEvent e);
    void mouseExited(MouseEvent e);
}

public interface MouseMotionListener extends EventListener {
    void mouseDragged(MouseEvent e);
    void mouseMoved(MouseEvent e);
}

public interface KeyListener extends EventListener {
    void keyTyped(KeyEvent e);
    void keyPressed(KeyEvent e);
    void keyReleased(KeyEvent e);
}

public interface WindowListener extends EventListener {
    void windowOpened(WindowEvent e);
    void windowClosing(WindowEvent e);
    void windowClosed(WindowEvent e);
    void windowIconified(WindowEvent e);
    void windowDeiconified(WindowEvent e);
    void windowActivated(WindowEvent e);
    void windowDeactivated(WindowEvent e);
}

public interface ComponentListener extends EventListener {
    void componentResized(ComponentEvent e);
    void componentMoved(ComponentEvent e);
    void componentShown(ComponentEvent e);
    void componentHidden(ComponentEvent e);
}

public interface FocusListener extends EventListener {
    void focusGained(FocusEvent e);
    void focusLost(FocusEvent e);
}

public interface ItemListener extends EventListener {
    void itemStateChanged(ItemEvent e);
}

public interface TextListener extends EventListener {
    void textValueChanged(TextEvent e);
}

public interface AdjustmentListener extends EventListener {
    void adjustmentValueChanged(AdjustmentEvent e);
}
"#;

const JAVA_BEANS: &str = r#"
package java.beans;

import java.util.EventListener;
import java.util.EventObject;

public class PropertyChangeEvent extends EventObject {
    public PropertyChangeEvent(Object source, String propertyName, Object oldValue, Object newValue) {}
    public String getPropertyName() {}
    public Object getOldValue() {}
    public Object getNewValue() {}
}

public class PropertyVetoException extends Exception {
    public PropertyVetoException(String message, PropertyChangeEvent evt) {}
}

public interface PropertyChangeListener extends EventListener {
    void propertyChange(PropertyChangeEvent evt);
}

public interface VetoableChangeListener extends EventListener {
    void vetoableChange(PropertyChangeEvent evt) throws PropertyVetoException;
}
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reflect::ClassRegistry;

    #[test]
    fn test_every_bundled_unit_parses() {
        let mut registry = ClassRegistry::new();
        for source in JDK_SOURCES {
            registry.load_source(source).unwrap();
        }
        assert!(registry.contains("java.lang.NoClassDefFoundError"));
        assert!(registry.contains("java.beans.VetoableChangeListener"));
    }

    #[test]
    fn test_supertypes_resolve() {
        let registry = ClassRegistry::with_jdk();
        let key = registry.lookup("java.awt.event.KeyEvent").unwrap();
        assert_eq!(key.super_class.as_deref(), Some("java.awt.event.InputEvent"));
        let awt = registry.lookup("java.awt.AWTEvent").unwrap();
        assert_eq!(awt.super_class.as_deref(), Some("java.util.EventObject"));
        let veto = &registry.lookup("java.beans.VetoableChangeListener").unwrap().methods[0];
        assert_eq!(veto.exceptions, vec!["java.beans.PropertyVetoException".to_string()]);
    }
}
