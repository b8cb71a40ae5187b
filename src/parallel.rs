use std::thread;
use std::panic::{ self, AssertUnwindSafe };
use std::sync::mpsc;
use std::sync::{ Arc, Mutex };

use log::{ debug, info, warn };

use crate::error::{ Error, Result };
use crate::color::Color;
use crate::world::World;
use crate::camera::Camera;
use crate::canvas::Canvas;
use crate::consts::PIXEL_BATCH_SIZE;

pub enum Message {
    /// A batch of `(x, y)` pixel coordinates to trace.
    Pixels(Vec<(usize, usize)>),
    Terminate,
}

/// What a worker sends back to the coordinator.
#[derive(Debug)]
pub enum Traced {
    Pixel(usize, usize, Color),

    /// Tracing a pixel panicked. The worker has exited.
    Failed { x: usize, y: usize },
}

/// Computes the color of one pixel; shared by every worker in a pool.
pub type Tracer = Arc<dyn Fn(usize, usize) -> Color + Send + Sync>;

struct Worker {
    thread: Option<thread::JoinHandle<()>>,
}

impl Worker {
    fn new(trace: Tracer, receiver: Arc<Mutex<mpsc::Receiver<Message>>>,
        results: mpsc::Sender<Traced>) -> Worker {

        let thread = thread::spawn(move || loop {
            let message = match receiver.lock() {
                Ok(guard) => guard.recv(),
                Err(_) => break,
            };

            match message {
                Ok(Message::Pixels(batch)) => {
                    for (x, y) in batch {
                        let traced = panic::catch_unwind(
                            AssertUnwindSafe(|| trace(x, y))
                        );

                        let reply = match traced {
                            Ok(color) => Traced::Pixel(x, y, color),
                            Err(_) => {
                                // Tell the coordinator rather than leave it
                                // waiting on a pixel that never comes
                                let _ = results.send(Traced::Failed { x, y });
                                return;
                            },
                        };

                        if results.send(reply).is_err() {
                            // The coordinator gave up on this render
                            return;
                        }
                    }
                },

                // Exit on request, or once the pool has been dropped
                Ok(Message::Terminate) | Err(_) => break,
            }
        });

        Worker { thread: Some(thread) }
    }
}

/// A fixed-size pool of render threads sharing one job queue.
///
/// Every worker holds a handle to the same tracer, and through it to the
/// same world and camera; neither is mutated while rendering, so no locks
/// are taken on scene data.
pub struct ThreadPool {
    workers: Vec<Worker>,
    sender: mpsc::Sender<Message>,
}

impl ThreadPool {
    /// Spawns `size` workers (at least one). Traced pixels are delivered on
    /// `results`.
    pub fn new(size: usize, trace: Tracer, results: mpsc::Sender<Traced>)
        -> ThreadPool {
        let size = size.max(1);
        let (sender, receiver) = mpsc::channel();
        let receiver = Arc::new(Mutex::new(receiver));

        let mut workers = Vec::with_capacity(size);

        for _ in 0..size {
            workers.push(Worker::new(
                Arc::clone(&trace),
                Arc::clone(&receiver),
                results.clone(),
            ));
        }

        ThreadPool { workers, sender }
    }

    pub fn size(&self) -> usize {
        self.workers.len()
    }

    /// Queues a message for the next idle worker.
    ///
    /// Fails only when every worker has already exited.
    pub fn execute(&self, message: Message) -> Result<()> {
        self.sender.send(message).map_err(|_| Error::WorkerPanicked)
    }

    /// Stops every worker and waits for them to exit.
    ///
    /// Returns `Error::WorkerPanicked` if any thread died outside of tracing.
    pub fn join(mut self) -> Result<()> {
        self.shutdown()
    }

    fn shutdown(&mut self) -> Result<()> {
        for _ in &self.workers {
            // A worker that already exited has dropped its end; that is fine
            let _ = self.sender.send(Message::Terminate);
        }

        let mut panicked = false;
        for worker in &mut self.workers {
            if let Some(thread) = worker.thread.take() {
                panicked |= thread.join().is_err();
            }
        }

        if panicked {
            Err(Error::WorkerPanicked)
        } else {
            Ok(())
        }
    }
}

impl Drop for ThreadPool {
    fn drop(&mut self) {
        let _ = self.shutdown();
    }
}

/// The worker count used when none is given.
pub fn default_workers() -> usize {
    thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

/// Renders a world through a camera on a pool of worker threads.
///
/// Pixels are handed out in row-major batches and written back by
/// coordinate, so the canvas is identical to a sequential render whatever
/// the worker count. `workers` defaults to the available parallelism.
///
/// The whole render is abandoned if a pixel comes out non-finite or a worker
/// panics.
pub fn render(camera: &Camera, world: &World, workers: Option<usize>)
    -> Result<Canvas> {
    let world = Arc::new(world.clone());
    let camera = Arc::new(camera.clone());
    let (hsize, vsize) = (camera.hsize, camera.vsize);

    let trace: Tracer = Arc::new(move |x: usize, y: usize| {
        world.color_at(&camera.ray_for_pixel(x, y))
    });
    render_with(hsize, vsize, workers, trace)
}

/// Fills an `hsize` by `vsize` canvas by calling `trace` for every pixel on
/// a pool of worker threads.
pub fn render_with(hsize: usize, vsize: usize, workers: Option<usize>,
    trace: Tracer) -> Result<Canvas> {
    let workers = workers.unwrap_or_else(default_workers).max(1);
    info!("rendering {}x{} using {} worker threads", hsize, vsize, workers);

    let (results_tx, results_rx) = mpsc::channel();
    let pool = ThreadPool::new(workers, trace, results_tx);

    let coords: Vec<(usize, usize)> = (0..vsize)
        .flat_map(|y| (0..hsize).map(move |x| (x, y)))
        .collect();

    let mut batches = 0;
    for batch in coords.chunks(PIXEL_BATCH_SIZE) {
        pool.execute(Message::Pixels(batch.to_vec()))?;
        batches += 1;
    }
    debug!("dispatched {} batches of up to {} pixels", batches, PIXEL_BATCH_SIZE);

    let mut canvas = Canvas::new(hsize, vsize);
    for _ in 0..coords.len() {
        // Every worker holds a sender, so this ends early only if all of
        // them die without reporting
        let traced = match results_rx.recv() {
            Ok(traced) => traced,
            Err(_) => {
                warn!("aborting render: workers exited early");
                return Err(abort(pool, results_rx, Error::WorkerPanicked));
            },
        };

        match traced {
            Traced::Pixel(x, y, color) if color.is_finite() => {
                canvas.write_pixel(x, y, &color);
            },
            Traced::Pixel(x, y, _) => {
                warn!("aborting render: pixel ({}, {}) is not finite", x, y);
                return Err(abort(pool, results_rx, Error::NonFinitePixel { x, y }));
            },
            Traced::Failed { x, y } => {
                warn!("aborting render: worker panicked tracing pixel ({}, {})", x, y);
                return Err(abort(pool, results_rx, Error::WorkerPanicked));
            },
        }
    }

    pool.join().map_err(|e| {
        warn!("render finished but a worker panicked");
        e
    })?;
    info!("rendered {} pixels", coords.len());

    Ok(canvas)
}

/// Stops the pool of an abandoned render and hands back `cause`.
///
/// Anything that goes wrong while stopping is logged; it never replaces
/// the error that ended the render.
fn abort(pool: ThreadPool, results: mpsc::Receiver<Traced>, cause: Error)
    -> Error {
    // Drop the receiver first so busy workers stop at their next send
    drop(results);

    if let Err(e) = pool.join() {
        warn!("while stopping workers: {}", e);
    }

    cause
}

#[cfg(test)]
fn default_scene_camera(hsize: usize, vsize: usize) -> Camera {
    use crate::tuple::Tuple4D;
    use crate::matrix::Matrix4D;

    let from = Tuple4D::point(0.0, 0.0, -5.0);
    let to = Tuple4D::point(0.0, 0.0, 0.0);
    let up = Tuple4D::vector(0.0, 1.0, 0.0);

    Camera::new(hsize, vsize, std::f64::consts::FRAC_PI_2)
        .with_transform(Matrix4D::view_transform(from, to, up).unwrap())
        .unwrap()
}

/// Runs `render_with` on its own thread, failing the test if it does not
/// return in time.
#[cfg(test)]
fn render_within_timeout(hsize: usize, vsize: usize, workers: usize,
    trace: Tracer) -> Result<Canvas> {
    use std::time::Duration;

    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let _ = tx.send(render_with(hsize, vsize, Some(workers), trace));
    });

    rx.recv_timeout(Duration::from_secs(30))
        .unwrap_or_else(|_| panic!("render did not finish"))
}

#[test]
fn parallel_render_of_default_world() {
    let w = World::default();
    let c = default_scene_camera(11, 11);

    let image = render(&c, &w, Some(2)).unwrap();
    assert_eq!(image.read_pixel(5, 5).unwrap(),
        Color::rgb(0.38066, 0.47583, 0.2855));
}

#[test]
fn parallel_render_matches_sequential_render() {
    let w = World::default();
    // Spans several batches, with a partial one at the end
    let c = default_scene_camera(41, 31);

    let expected = c.render(&w).unwrap();
    for &workers in [1, 4].iter() {
        assert_eq!(render(&c, &w, Some(workers)).unwrap(), expected);
    }
}

#[test]
fn zero_workers_still_renders() {
    let w = World::default();
    let c = default_scene_camera(5, 5);

    let image = render(&c, &w, Some(0)).unwrap();
    assert_eq!(image, c.render(&w).unwrap());
}

#[test]
fn non_finite_pixel_aborts_render() {
    let mut w = World::default();
    w.objects[0].material.ambient = std::f64::NAN;
    let c = default_scene_camera(11, 11);

    match render(&c, &w, Some(2)) {
        Err(Error::NonFinitePixel { .. }) => {},
        other => panic!("expected a non-finite pixel error, got {:?}", other),
    }
}

#[test]
fn panicking_worker_aborts_render() {
    // Right half of a small image, then one pixel deep inside a render
    // spanning many batches
    let cases: Vec<(usize, usize, Tracer)> = vec![
        (11, 11, Arc::new(|x: usize, _: usize| {
            if x > 5 { panic!("bad pixel") }
            Color::white()
        })),
        (100, 100, Arc::new(|x: usize, y: usize| {
            if (x, y) == (50, 50) { panic!("bad pixel") }
            Color::white()
        })),
    ];

    for (hsize, vsize, trace) in cases {
        match render_within_timeout(hsize, vsize, 4, trace) {
            Err(Error::WorkerPanicked) => {},
            other => panic!("expected a worker panic, got {:?}", other),
        }
    }
}

#[test]
fn first_render_error_is_reported() {
    // A single worker traces in order: the non-finite pixel reaches the
    // coordinator before the panic that follows it
    let trace: Tracer = Arc::new(|x: usize, y: usize| {
        match (x, y) {
            (0, 0) => Color::rgb(std::f64::NAN, 0.0, 0.0),
            _ => panic!("bad pixel"),
        }
    });

    match render_within_timeout(4, 4, 1, trace) {
        Err(Error::NonFinitePixel { x: 0, y: 0 }) => {},
        other => panic!("expected a non-finite pixel error, got {:?}", other),
    }
}
