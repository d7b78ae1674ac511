//! Mount adapter: tie a rendering root's lifetime to its host component.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use tracing::debug;

/// Host-side component that announces its own destruction.
pub trait HostComponent {
    /// Registers a callback to run when the component is destroyed. Hosts
    /// fire destruction at most once.
    fn on_destroy(&self, callback: Box<dyn FnOnce()>);
}

/// A live rendering root owning one container.
pub trait RenderRoot {
    type Content;
    type Error;

    /// Renders `content`, replacing whatever the root currently shows.
    fn render(&self, content: Self::Content) -> Result<(), Self::Error>;

    /// Tears the root down and releases its container.
    fn unmount(&self);
}

/// Factory for rendering roots.
pub trait Renderer {
    type Container;
    type Options;
    type Root: RenderRoot;

    fn create_root(
        &self,
        container: Self::Container,
        options: Self::Options,
    ) -> Result<Self::Root, <Self::Root as RenderRoot>::Error>;
}

/// Creates a root on `container`, arranges for it to unmount when `host`
/// is destroyed, and performs the initial render of `content`.
///
/// The destroy hook is registered before the initial render, so the root
/// is torn down with its host even when that first render fails. Teardown
/// is one-shot: manual [`Mounted::unmount`] followed by host destruction
/// (or the reverse) unmounts exactly once.
///
/// # Example
///
/// ```
/// use std::cell::RefCell;
/// use std::convert::Infallible;
/// use std::rc::Rc;
/// use model_bind::{mount, HostComponent, Renderer, RenderRoot};
///
/// #[derive(Default)]
/// struct Host {
///     destroyers: RefCell<Vec<Box<dyn FnOnce()>>>,
/// }
///
/// impl HostComponent for Host {
///     fn on_destroy(&self, callback: Box<dyn FnOnce()>) {
///         self.destroyers.borrow_mut().push(callback);
///     }
/// }
///
/// struct TextRoot {
///     container: Rc<RefCell<String>>,
/// }
///
/// impl RenderRoot for TextRoot {
///     type Content = String;
///     type Error = Infallible;
///
///     fn render(&self, content: String) -> Result<(), Infallible> {
///         *self.container.borrow_mut() = content;
///         Ok(())
///     }
///
///     fn unmount(&self) {
///         self.container.borrow_mut().clear();
///     }
/// }
///
/// struct TextRenderer;
///
/// impl Renderer for TextRenderer {
///     type Container = Rc<RefCell<String>>;
///     type Options = ();
///     type Root = TextRoot;
///
///     fn create_root(&self, container: Self::Container, _options: ()) -> Result<TextRoot, Infallible> {
///         Ok(TextRoot { container })
///     }
/// }
///
/// let host = Host::default();
/// let container = Rc::new(RefCell::new(String::new()));
/// let mounted = mount(&host, &TextRenderer, Rc::clone(&container), "hello".to_string(), ()).unwrap();
/// assert_eq!(container.borrow().as_str(), "hello");
///
/// let destroyers: Vec<_> = host.destroyers.borrow_mut().drain(..).collect();
/// for destroy in destroyers {
///     destroy();
/// }
/// assert!(container.borrow().is_empty());
/// assert!(mounted.is_unmounted());
/// ```
pub fn mount<H, R>(
    host: &H,
    renderer: &R,
    container: R::Container,
    content: <R::Root as RenderRoot>::Content,
    options: R::Options,
) -> Result<Mounted<R::Root>, <R::Root as RenderRoot>::Error>
where
    H: HostComponent,
    R: Renderer,
    R::Root: 'static,
{
    let root = Rc::new(renderer.create_root(container, options)?);
    debug!("created rendering root");
    let unmounted = Rc::new(Cell::new(false));

    let destroy_root = Rc::clone(&root);
    let destroy_flag = Rc::clone(&unmounted);
    host.on_destroy(Box::new(move || {
        if !destroy_flag.replace(true) {
            debug!("unmounting root with destroyed host");
            destroy_root.unmount();
        }
    }));

    root.render(content)?;
    Ok(Mounted { root, unmounted })
}

/// Handle to a mounted root.
pub struct Mounted<R: RenderRoot> {
    root: Rc<R>,
    unmounted: Rc<Cell<bool>>,
}

impl<R: RenderRoot> Mounted<R> {
    pub fn root(&self) -> &R {
        &self.root
    }

    /// Renders fresh content into the root.
    pub fn render(&self, content: R::Content) -> Result<(), R::Error> {
        self.root.render(content)
    }

    /// Unmounts now instead of waiting for host destruction. The later
    /// destroy callback then finds the flag already set and does nothing.
    pub fn unmount(&self) {
        if !self.unmounted.replace(true) {
            debug!("unmounting root");
            self.root.unmount();
        }
    }

    pub fn is_unmounted(&self) -> bool {
        self.unmounted.get()
    }
}

impl<R: RenderRoot> fmt::Debug for Mounted<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mounted")
            .field("unmounted", &self.unmounted.get())
            .finish()
    }
}
